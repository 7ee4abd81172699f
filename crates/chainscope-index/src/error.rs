use thiserror::Error;

/// Errors from index table operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid index magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("index table corrupted: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
