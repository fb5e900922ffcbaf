/// Errors that can occur in manager operations.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] lanpacket_frame::FrameError),

    /// The sink rejected an outbound frame.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
