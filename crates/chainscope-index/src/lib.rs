//! Lookup tables for chainscope.
//!
//! Both indices here are built once, offline, by the dataset writer and
//! queried read-only for the life of the process. The tables are sorted
//! arrays with binary search -- no hashing at query time, no locks, and any
//! number of threads may query concurrently.
//!
//! - [`HashIndex`] — transaction hash to dense transaction index, with a
//!   256-entry fan-out table bucketing the sorted hashes by first byte
//! - [`AddressIndex`] — canonical address string to `(index, type)`, plus
//!   prefix queries; keys are sorted lexicographically by byte, and prefix
//!   results are returned in that order (callers may rely on it)

pub mod address_index;
pub mod error;
pub mod hash_index;
mod table;

pub use address_index::AddressIndex;
pub use error::{IndexError, IndexResult};
pub use hash_index::HashIndex;
