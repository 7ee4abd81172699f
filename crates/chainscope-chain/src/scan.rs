//! Lazy scans over the chain.
//!
//! Every iterator here is restartable (call the producing method again),
//! finite, and free to abandon early: the engine is read-only, so there
//! is no background work to cancel and no side effect to undo. Iterators
//! are not internally synchronized; each consumer uses its own handle.

use chainscope_store::{Block, ChainStore, Output, ScriptVariant, Transaction};
use chainscope_types::AddressType;

use crate::error::ChainResult;

/// Iterator over a contiguous height range.
#[derive(Clone)]
pub struct Blocks<'a> {
    store: &'a ChainStore,
    next: u64,
    end: u64,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(store: &'a ChainStore, start: u64, end: u64) -> Self {
        debug_assert!(start <= end && end <= store.block_count());
        Self {
            store,
            next: start,
            end,
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let block = self.store.block(self.next).ok()?;
        self.next += 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Blocks<'_> {}

/// Lazy single-pass scan over every output not consumed by a later input.
#[derive(Clone)]
pub struct UnspentOutputs<'a> {
    store: &'a ChainStore,
    next: u64,
    end: u64,
}

impl<'a> UnspentOutputs<'a> {
    pub(crate) fn new(store: &'a ChainStore) -> Self {
        Self {
            store,
            next: 0,
            end: store.output_count(),
        }
    }
}

impl<'a> Iterator for UnspentOutputs<'a> {
    type Item = Output<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let output = self.store.output(self.next).ok()?;
            self.next += 1;
            if !output.is_spent() {
                return Some(output);
            }
        }
        None
    }
}

/// Lazy scan over transactions carrying at least one output of a type.
///
/// Outputs with an undecodable address type byte never match; corruption
/// of that kind is reported by the store's explicit verify pass, not by
/// this filter.
#[derive(Clone)]
pub struct TypeTransactions<'a> {
    store: &'a ChainStore,
    ty: AddressType,
    next: u32,
    end: u64,
}

impl<'a> TypeTransactions<'a> {
    pub(crate) fn new(store: &'a ChainStore, ty: AddressType) -> Self {
        Self {
            store,
            ty,
            next: 0,
            end: store.tx_count(),
        }
    }
}

impl<'a> Iterator for TypeTransactions<'a> {
    type Item = Transaction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while (self.next as u64) < self.end {
            let tx = self.store.transaction(self.next).ok()?;
            self.next += 1;
            let matches = tx
                .outputs()
                .any(|o| o.address().map(|a| a.ty == self.ty).unwrap_or(false));
            if matches {
                return Some(tx);
            }
        }
        None
    }
}

/// Lazy walk over every dense address index of one type.
#[derive(Clone)]
pub struct TypeAddresses<'a> {
    store: &'a ChainStore,
    ty: AddressType,
    next: u32,
    count: u64,
}

impl<'a> TypeAddresses<'a> {
    pub(crate) fn new(store: &'a ChainStore, ty: AddressType) -> Self {
        Self {
            store,
            ty,
            next: 0,
            count: store.address_count(ty),
        }
    }
}

impl<'a> Iterator for TypeAddresses<'a> {
    type Item = ChainResult<ScriptVariant<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if (self.next as u64) >= self.count {
            return None;
        }
        let result = self.store.script(self.next, self.ty).map_err(Into::into);
        self.next += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next as u64) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TypeAddresses<'_> {}
