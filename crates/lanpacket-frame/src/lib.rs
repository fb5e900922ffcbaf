//! Checksummed LAN frame codec with nested typed sub-packets.
//!
//! Every frame on the wire starts with a fixed 17-byte header:
//! - `0xAA` start magic, `0xA5` end magic at offset 15
//! - a little-endian request id, the frame type and a little-endian payload length
//! - an XOR checksum over the first 16 header bytes
//!
//! The payload is a sequence of sub-packets, each a 1-byte type, a 1-byte
//! body length and up to 253 body bytes. Corrupt or unexpected input is
//! skipped one byte at a time until a valid header shows up again.

pub mod error;
pub mod frame;
pub mod header;
pub mod subpacket;
pub mod types;

pub use error::{FrameError, Result};
pub use frame::{Frame, FrameConfig, FrameWrite, SubPackets};
pub use header::{
    header_checksum, HEADER_SIZE, MAGIC_END, MAGIC_START, MAX_FRAME_SIZE, MAX_SUBPACKET_BODY,
    MAX_SUBPACKET_SIZE, SUBPACKET_HEADER_SIZE,
};
pub use subpacket::{SubPacket, SubPacketWriter};
pub use types::{frame_type_name, is_reserved, NOP};
