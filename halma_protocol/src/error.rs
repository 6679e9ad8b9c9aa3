use thiserror::Error;

/// Failure to move a message across a connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame too large: {len} bytes")]
    FrameTooLarge { len: usize },
    #[error("rejected by server: {0}")]
    Rejected(String),
    #[error("unexpected message: {0}")]
    Unexpected(String),
}
