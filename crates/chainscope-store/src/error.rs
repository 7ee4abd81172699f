use std::path::PathBuf;

use chainscope_types::{AddressType, Hash256};
use thiserror::Error;

/// Errors from chain store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The data directory or one of its files does not exist.
    #[error("chain data missing: {0}")]
    Missing(PathBuf),

    #[error("invalid file magic in {path}: expected {expected}, got {actual}")]
    InvalidMagic {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("unsupported format version {version} in {path}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    /// A store file failed structural validation at open or a CRC check.
    #[error("corrupt store file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    /// A record decoded from a validated file is internally inconsistent.
    #[error("corrupt record at index {index}: {reason}")]
    CorruptEntry { index: u64, reason: String },

    /// A script payload does not match its type's expected shape.
    #[error("corrupt {ty} script payload at index {index}: {reason}")]
    CorruptScript {
        ty: AddressType,
        index: u32,
        reason: String,
    },

    /// File record counts disagree with the manifest.
    #[error("store inconsistent with manifest: {0}")]
    Inconsistent(String),

    /// A serialized configuration state tuple could not be decoded.
    #[error("malformed configuration state: {0}")]
    MalformedState(String),

    /// The on-disk chain tip does not match expectations (error_on_reorg).
    #[error("reorg detected at height {height}: expected parent {expected}, found {actual}")]
    ReorgDetected {
        height: u64,
        expected: Hash256,
        actual: Hash256,
    },

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: u64,
        len: u64,
    },

    /// Misuse of the fixture/dataset builder.
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
