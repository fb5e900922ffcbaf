//! Dispatch layer for LAN packet frames.
//!
//! A [`PacketManager`] owns the receive-side rolling buffer, routes every
//! sub-packet to the handler registered for its (frame type, sub-packet type)
//! pair, and writes outbound frames to a [`FrameSink`]. It knows nothing about
//! the physical transport.

pub mod config;
pub mod error;
pub mod manager;
pub mod outbound;
pub mod sink;
pub mod stats;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result};
pub use manager::{Handler, PacketManager};
pub use outbound::Outbound;
pub use sink::{FrameSink, StreamSink};
pub use stats::ManagerStats;
