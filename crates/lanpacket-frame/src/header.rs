//! Frame header layout.
//!
//! ```text
//! ┌──────┬──────────┬────────────┬──────────┬──────┬──────┬──────────┬──────┬──────────┐
//! │ 0xAA │ reserved │ request id │ reserved │ type │ rsvd │ length   │ 0xA5 │ checksum │
//! │ 1B   │ 6B       │ 2B LE      │ 2B       │ 1B   │ 1B   │ 2B LE    │ 1B   │ 1B XOR   │
//! └──────┴──────────┴────────────┴──────────┴──────┴──────┴──────────┴──────┴──────────┘
//!   0      1..=6      7..=8        9..=10     11     12     13..=14    15     16
//! ```

/// Frame header size in bytes.
pub const HEADER_SIZE: usize = 17;

/// First header byte.
pub const MAGIC_START: u8 = 0xAA;

/// Header byte at [`OFFSET_MAGIC_END`].
pub const MAGIC_END: u8 = 0xA5;

/// Maximum total frame size (header + payload).
pub const MAX_FRAME_SIZE: usize = 512;

/// Maximum serialized sub-packet size (header + body).
pub const MAX_SUBPACKET_SIZE: usize = 255;

/// Sub-packet header: type (1) + body length (1).
pub const SUBPACKET_HEADER_SIZE: usize = 2;

/// Largest body a single sub-packet can carry.
pub const MAX_SUBPACKET_BODY: usize = MAX_SUBPACKET_SIZE - SUBPACKET_HEADER_SIZE;

pub const OFFSET_REQUEST_ID: usize = 7;
pub const OFFSET_TYPE: usize = 11;
pub const OFFSET_DATA_SIZE: usize = 13;
pub const OFFSET_MAGIC_END: usize = 15;
pub const OFFSET_CHECKSUM: usize = 16;

/// XOR of the first 16 header bytes.
///
/// Returns 0 when fewer than 16 bytes are available.
pub fn header_checksum(buf: &[u8]) -> u8 {
    match buf.get(..OFFSET_CHECKSUM) {
        Some(bytes) => bytes.iter().fold(0u8, |acc, b| acc ^ b),
        None => 0,
    }
}
