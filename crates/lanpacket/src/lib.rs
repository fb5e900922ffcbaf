//! LAN bus packet framing, resynchronization and dispatch.
//!
//! # Crate Structure
//!
//! - [`frame`]: Frame (LP) and sub-packet (UP) wire codec
//! - [`manager`]: Handler dispatch and outbound frame coalescing

/// Re-export frame types.
pub mod frame {
    pub use lanpacket_frame::*;
}

/// Re-export manager types.
pub mod manager {
    pub use lanpacket_manager::*;
}

pub use lanpacket_frame::{Frame, FrameError, SubPacket, SubPacketWriter, NOP};
pub use lanpacket_manager::{FrameSink, ManagerConfig, ManagerError, PacketManager, StreamSink};
