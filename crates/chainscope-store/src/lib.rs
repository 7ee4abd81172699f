//! Memory-mapped chain store for chainscope.
//!
//! The store is an immutable snapshot of an already-parsed blockchain:
//! fixed-width record files for blocks, transactions, inputs, and outputs,
//! plus per-type script payload files, all mapped read-only. It is written
//! once, offline, by the upstream parser (or by [`StoreBuilder`] in tests)
//! and never mutated afterwards.
//!
//! # Design Rules
//!
//! 1. Open acquires every mapping up front; everything after open is a
//!    read with no locking (the data never changes).
//! 2. Entities ([`Block`], [`Transaction`], [`Input`], [`Output`]) borrow
//!    the store, so the borrow checker keeps every view inside the
//!    mapping's lifetime.
//! 3. Heights, transaction indices, and per-type address indices are
//!    dense, zero-based, and contiguous; that is the read contract the
//!    on-disk format must satisfy.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod builder;
pub mod config;
pub mod entities;
pub mod error;
pub mod format;
pub mod layout;
pub mod manifest;
pub mod records;
pub mod scripts;
pub mod store;

pub use builder::{ScriptSpec, StoreBuilder};
pub use config::DataConfiguration;
pub use entities::{
    Block, BlockTransactions, Input, Output, Transaction, TransactionInputs, TransactionOutputs,
};
pub use error::{StoreError, StoreResult};
pub use manifest::Manifest;
pub use scripts::ScriptVariant;
pub use store::{ChainStore, REORG_CHECK_WINDOW};
