use lanpacket_frame::FrameConfig;

/// Controls dispatch behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Limits applied to both the receive buffer and outbound frames.
    pub frame: FrameConfig,
    /// When true, NOP frames without a registered handler table get an empty NOP reply.
    pub reply_to_nop: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            reply_to_nop: true,
        }
    }
}
