use serde::Serialize;

/// Counters maintained by a [`PacketManager`](crate::PacketManager).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    /// Frames that passed header validation.
    pub frames_received: u64,
    /// Frames dropped because no handler table exists for their type.
    pub frames_dropped: u64,
    pub sub_packets_dispatched: u64,
    pub sub_packets_unhandled: u64,
    /// Sub-packets whose length overran their frame; the rest of that frame is lost.
    pub decode_errors: u64,
    /// Garbage bytes skipped while resynchronizing.
    pub bytes_discarded: u64,
    pub frames_sent: u64,
    pub nop_replies: u64,
    pub send_errors: u64,
}
