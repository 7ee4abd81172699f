use std::fmt;

use chainscope_store::Block;

use crate::blockchain::Blockchain;
use crate::error::{ChainError, ChainResult};
use crate::scan::Blocks;

/// A bounded view over a contiguous height range of a [`Blockchain`].
///
/// Produced by [`Blockchain::segment`]; shares the underlying store with
/// the owning chain (nothing is copied) and cannot outlive it.
#[derive(Clone, Copy)]
pub struct ChainRange<'a> {
    chain: &'a Blockchain,
    start: u64,
    end: u64,
}

impl<'a> ChainRange<'a> {
    pub(crate) fn new(chain: &'a Blockchain, start: u64, end: u64) -> Self {
        Self { chain, start, end }
    }

    /// The `[start, end)` height bounds of this range.
    pub fn bounds(&self) -> (u64, u64) {
        (self.start, self.end)
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Block at position `i` within the range.
    pub fn at(&self, i: u64) -> ChainResult<Block<'a>> {
        if i >= self.len() {
            return Err(ChainError::IndexOutOfRange {
                kind: "block height",
                index: i as i64,
                len: self.len(),
            });
        }
        self.chain.block_at_height(self.start + i)
    }

    /// Iterate the range's blocks in height order.
    pub fn iter(&self) -> Blocks<'a> {
        Blocks::new(self.chain.store(), self.start, self.end)
    }

    /// Total transactions across the range.
    pub fn tx_count(&self) -> u64 {
        self.iter().map(|b| b.tx_count() as u64).sum()
    }
}

impl<'a> IntoIterator for &ChainRange<'a> {
    type Item = Block<'a>;
    type IntoIter = Blocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ChainRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainRange")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}
