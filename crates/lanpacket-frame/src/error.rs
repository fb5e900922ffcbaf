/// Errors that can occur while building or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A sub-packet body would exceed the 1-byte length field.
    #[error("sub-packet body too large ({size} bytes, max {max})")]
    SubPacketOverflow { size: usize, max: usize },

    /// The frame (header + payload) would exceed the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameOverflow { size: usize, max: usize },

    /// A sub-packet declares more body bytes than its frame carries.
    #[error("sub-packet 0x{sub_type:02x} declares {declared} bytes but only {available} remain")]
    SubPacketTruncated {
        sub_type: u8,
        declared: usize,
        available: usize,
    },

    /// An I/O error occurred while flushing a frame to its sink.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
