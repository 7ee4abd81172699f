//! Foundation types for chainscope.
//!
//! This crate provides the identifier and address types shared by every
//! other chainscope crate. Every value here is a plain, immutable datum;
//! nothing in this crate touches the disk.
//!
//! # Key Types
//!
//! - [`Hash256`] — 32-byte block/transaction hash with hex forms
//! - [`BlockHeight`] — signed height, so negative indexing is expressible
//!   at the API boundary (stored heights are dense `0..N`)
//! - [`AddressType`] — closed enumeration of on-chain script encodings
//! - [`Address`] — a `(dense index, AddressType)` identity pair
//! - [`encoding`] — the canonical `tag:hex` textual address form

pub mod address;
pub mod encoding;
pub mod error;
pub mod hash;

pub use address::{Address, AddressType};
pub use encoding::{parse_address, ParsedAddress};
pub use error::TypeError;
pub use hash::Hash256;

/// Block height. Signed so callers can express negative (wrapping) indices;
/// heights stored on disk are always in the dense range `0..N`.
pub type BlockHeight = i64;
