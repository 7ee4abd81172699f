use chainscope_index::IndexError;
use chainscope_store::StoreError;
use chainscope_types::{Hash256, TypeError};
use thiserror::Error;

/// Errors surfaced by the blockchain facade.
///
/// Every error is raised synchronously at the call that triggered it;
/// nothing is retried internally, since no transient failure mode exists
/// once the store is open.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Store or index files missing or corrupt at open.
    #[error("chain data unavailable: {0}")]
    DataUnavailable(String),

    /// The on-disk tip is inconsistent and `error_on_reorg` is set.
    #[error("reorg detected at height {height}: expected parent {expected}, found {actual}")]
    ReorgDetected {
        height: u64,
        expected: Hash256,
        actual: Hash256,
    },

    /// A serialized configuration state could not be decoded.
    #[error("malformed configuration state: {0}")]
    MalformedState(String),

    /// Height, transaction index, or address index beyond valid bounds.
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: u64,
    },

    /// Slice step of zero.
    #[error("slice step must be non-zero")]
    InvalidSlice,

    /// Non-positive segment count.
    #[error("segment count must be positive, got {0}")]
    InvalidArgument(i64),

    /// Hash with no match, where absence is an error.
    #[error("no transaction with hash {0}")]
    NotFound(Hash256),

    /// String that cannot be parsed as any known address encoding.
    #[error("malformed address string: {0}")]
    MalformedAddress(String),
}

impl From<StoreError> for ChainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ReorgDetected {
                height,
                expected,
                actual,
            } => Self::ReorgDetected {
                height,
                expected,
                actual,
            },
            StoreError::IndexOutOfRange { kind, index, len } => Self::IndexOutOfRange {
                kind,
                index: index as i64,
                len,
            },
            StoreError::MalformedState(reason) => Self::MalformedState(reason),
            other => Self::DataUnavailable(other.to_string()),
        }
    }
}

impl From<IndexError> for ChainError {
    fn from(e: IndexError) -> Self {
        Self::DataUnavailable(e.to_string())
    }
}

impl From<TypeError> for ChainError {
    fn from(e: TypeError) -> Self {
        Self::MalformedAddress(e.to_string())
    }
}

/// Result alias for facade operations.
pub type ChainResult<T> = Result<T, ChainError>;
