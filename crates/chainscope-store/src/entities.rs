//! Typed views over the mapped chain files.
//!
//! Every entity borrows the [`ChainStore`] it came from; none of them own
//! data. A view cannot outlive the store, so the mapping is always valid
//! for as long as a view exists; the scoped-acquisition discipline is
//! enforced by the borrow checker rather than by convention.

use std::fmt;

use chainscope_types::{Address, AddressType, Hash256};

use crate::error::{StoreError, StoreResult};
use crate::records::{BlockRecord, InputRecord, OutputRecord, TxRecord, SPENDING_NONE};
use crate::scripts::ScriptVariant;
use crate::store::ChainStore;

fn resolve_address(code: u8, address_index: u32, record_index: u64) -> StoreResult<Address> {
    let ty = AddressType::from_code(code).ok_or_else(|| StoreError::CorruptEntry {
        index: record_index,
        reason: format!("unknown address type code {code}"),
    })?;
    Ok(Address::new(address_index, ty))
}

/// One block of the chain.
#[derive(Clone, Copy)]
pub struct Block<'a> {
    store: &'a ChainStore,
    height: u64,
    record: BlockRecord,
}

impl<'a> Block<'a> {
    pub(crate) fn new(store: &'a ChainStore, height: u64, record: BlockRecord) -> Self {
        Self {
            store,
            height,
            record,
        }
    }

    /// Height of this block; dense and zero-based.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn hash(&self) -> Hash256 {
        self.record.hash
    }

    /// Hash of the parent block; null for the genesis block.
    pub fn prev_hash(&self) -> Hash256 {
        self.record.prev_hash
    }

    /// Block timestamp (seconds since the epoch).
    pub fn time(&self) -> u32 {
        self.record.time
    }

    /// Number of transactions in this block.
    pub fn tx_count(&self) -> u32 {
        self.record.tx_count
    }

    /// Chain-wide dense index of this block's first transaction.
    pub fn first_tx_index(&self) -> u32 {
        self.record.first_tx
    }

    /// Iterate this block's transactions in order.
    pub fn transactions(&self) -> BlockTransactions<'a> {
        BlockTransactions {
            store: self.store,
            next: self.record.first_tx,
            end: self.record.first_tx + self.record.tx_count,
        }
    }

    /// Transaction at position `i` within this block.
    pub fn transaction(&self, i: u32) -> StoreResult<Transaction<'a>> {
        if i >= self.record.tx_count {
            return Err(StoreError::IndexOutOfRange {
                kind: "transaction",
                index: i as u64,
                len: self.record.tx_count as u64,
            });
        }
        Ok(self.store.transaction_unchecked(self.record.first_tx + i))
    }
}

impl PartialEq for Block<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.record.hash == other.record.hash
    }
}

impl Eq for Block<'_> {}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("height", &self.height)
            .field("hash", &self.record.hash)
            .field("tx_count", &self.record.tx_count)
            .finish()
    }
}

/// One transaction, addressed by its chain-wide dense index.
#[derive(Clone, Copy)]
pub struct Transaction<'a> {
    store: &'a ChainStore,
    index: u32,
    record: TxRecord,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(store: &'a ChainStore, index: u32, record: TxRecord) -> Self {
        Self {
            store,
            index,
            record,
        }
    }

    /// Chain-wide dense index; monotonic with block height.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn hash(&self) -> Hash256 {
        self.record.hash
    }

    /// Height of the owning block.
    pub fn block_height(&self) -> u64 {
        self.record.block_height as u64
    }

    /// The owning block.
    pub fn block(&self) -> Block<'a> {
        self.store.block_unchecked(self.record.block_height as u64)
    }

    pub fn locktime(&self) -> u32 {
        self.record.locktime
    }

    pub fn input_count(&self) -> u32 {
        self.record.input_count
    }

    pub fn output_count(&self) -> u32 {
        self.record.output_count
    }

    /// Iterate inputs in order.
    pub fn inputs(&self) -> TransactionInputs<'a> {
        TransactionInputs {
            store: self.store,
            next: self.record.first_input,
            end: self.record.first_input + self.record.input_count as u64,
        }
    }

    /// Iterate outputs in order.
    pub fn outputs(&self) -> TransactionOutputs<'a> {
        TransactionOutputs {
            store: self.store,
            next: self.record.first_output,
            end: self.record.first_output + self.record.output_count as u64,
        }
    }
}

impl PartialEq for Transaction<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.record.hash == other.record.hash
    }
}

impl Eq for Transaction<'_> {}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("index", &self.index)
            .field("hash", &self.record.hash)
            .finish()
    }
}

/// One transaction output.
#[derive(Clone, Copy)]
pub struct Output<'a> {
    store: &'a ChainStore,
    index: u64,
    record: OutputRecord,
}

impl<'a> Output<'a> {
    pub(crate) fn new(store: &'a ChainStore, index: u64, record: OutputRecord) -> Self {
        Self {
            store,
            index,
            record,
        }
    }

    /// Chain-wide dense output index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Output value in base units.
    pub fn value(&self) -> u64 {
        self.record.value
    }

    /// The `(index, type)` identity of the receiving address.
    pub fn address(&self) -> StoreResult<Address> {
        resolve_address(self.record.address_code, self.record.address_index, self.index)
    }

    /// Resolve the receiving address's script payload.
    pub fn script(&self) -> StoreResult<ScriptVariant<'a>> {
        let address = self.address()?;
        self.store.script(address.index, address.ty)
    }

    /// Whether a later input consumes this output.
    pub fn is_spent(&self) -> bool {
        self.record.spending_tx != SPENDING_NONE
    }

    /// Dense index of the spending transaction, if any.
    pub fn spending_tx(&self) -> Option<u32> {
        (self.record.spending_tx != SPENDING_NONE).then_some(self.record.spending_tx)
    }
}

impl fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("index", &self.index)
            .field("value", &self.record.value)
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// One transaction input.
#[derive(Clone, Copy)]
pub struct Input<'a> {
    store: &'a ChainStore,
    index: u64,
    record: InputRecord,
}

impl<'a> Input<'a> {
    pub(crate) fn new(store: &'a ChainStore, index: u64, record: InputRecord) -> Self {
        Self {
            store,
            index,
            record,
        }
    }

    /// Chain-wide dense input index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Value of the consumed output.
    pub fn value(&self) -> u64 {
        self.record.value
    }

    /// Address of the consumed output.
    pub fn address(&self) -> StoreResult<Address> {
        resolve_address(self.record.address_code, self.record.address_index, self.index)
    }

    /// Resolve the consumed output's script payload.
    pub fn script(&self) -> StoreResult<ScriptVariant<'a>> {
        let address = self.address()?;
        self.store.script(address.index, address.ty)
    }

    /// Dense index of the transaction whose output this input consumes.
    pub fn spent_tx_index(&self) -> u32 {
        self.record.spent_tx
    }

    /// Position of the consumed output within its transaction.
    pub fn spent_output_index(&self) -> u32 {
        self.record.spent_output
    }

    /// The consumed output itself.
    pub fn spent_output(&self) -> StoreResult<Output<'a>> {
        let tx = self.store.transaction(self.record.spent_tx)?;
        let global = tx.record.first_output + self.record.spent_output as u64;
        if self.record.spent_output >= tx.record.output_count {
            return Err(StoreError::CorruptEntry {
                index: self.index,
                reason: "input references output beyond its transaction".into(),
            });
        }
        Ok(self.store.output_unchecked(global))
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("index", &self.index)
            .field("spent_tx", &self.record.spent_tx)
            .field("spent_output", &self.record.spent_output)
            .finish()
    }
}

/// Iterator over a block's transactions.
#[derive(Clone)]
pub struct BlockTransactions<'a> {
    store: &'a ChainStore,
    next: u32,
    end: u32,
}

impl<'a> Iterator for BlockTransactions<'a> {
    type Item = Transaction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let tx = self.store.transaction_unchecked(self.next);
        self.next += 1;
        Some(tx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BlockTransactions<'_> {}

/// Iterator over a transaction's outputs.
#[derive(Clone)]
pub struct TransactionOutputs<'a> {
    store: &'a ChainStore,
    next: u64,
    end: u64,
}

impl<'a> Iterator for TransactionOutputs<'a> {
    type Item = Output<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let output = self.store.output_unchecked(self.next);
        self.next += 1;
        Some(output)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TransactionOutputs<'_> {}

/// Iterator over a transaction's inputs.
#[derive(Clone)]
pub struct TransactionInputs<'a> {
    store: &'a ChainStore,
    next: u64,
    end: u64,
}

impl<'a> Iterator for TransactionInputs<'a> {
    type Item = Input<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let input = self.store.input_unchecked(self.next);
        self.next += 1;
        Some(input)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TransactionInputs<'_> {}
