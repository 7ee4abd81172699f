use std::path::Path;

use chainscope_index::{AddressIndex, HashIndex};
use chainscope_store::{
    layout, Block, ChainStore, DataConfiguration, ScriptVariant, StoreError, Transaction,
};
use chainscope_types::{parse_address, AddressType, Hash256};

use crate::error::{ChainError, ChainResult};
use crate::scan::{Blocks, TypeAddresses, TypeTransactions, UnspentOutputs};
use crate::segment::segment_boundaries;
use crate::slice::slice_indices;
use crate::view::ChainRange;

/// Read facade over a parsed blockchain dataset.
///
/// Composes the mapped [`ChainStore`] with the transaction-hash and
/// address indices into one sized, randomly indexable, iterable,
/// sliceable collection of blocks. Everything is immutable after
/// [`open`](Self::open); any number of threads may query concurrently
/// without locking.
pub struct Blockchain {
    store: ChainStore,
    hash_index: HashIndex,
    address_index: AddressIndex,
}

impl Blockchain {
    /// Open the dataset at `path` with default policy.
    pub fn open(path: impl AsRef<Path>) -> ChainResult<Self> {
        Self::with_config(DataConfiguration::new(path.as_ref()))
    }

    /// Open with explicit load-time policy.
    pub fn with_config(config: DataConfiguration) -> ChainResult<Self> {
        let store = ChainStore::open(&config)?;
        let dir = config.data_directory.as_path();
        let hash_index = HashIndex::open(&layout::hash_index_file(dir))?;
        let address_index = AddressIndex::open(&layout::address_index_file(dir))?;
        tracing::info!(
            blocks = store.block_count(),
            txes = store.tx_count(),
            "opened blockchain"
        );
        Ok(Self {
            store,
            hash_index,
            address_index,
        })
    }

    /// The configuration this chain was opened with.
    pub fn config(&self) -> &DataConfiguration {
        self.store.config()
    }

    /// Total number of blocks.
    pub fn len(&self) -> u64 {
        self.store.block_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of transactions.
    pub fn tx_count(&self) -> u64 {
        self.store.tx_count()
    }

    /// Block at `height`. Negative heights wrap once from the end, so
    /// `-1` is the last block; a height outside `[-N, N)` fails with
    /// [`ChainError::IndexOutOfRange`].
    pub fn at(&self, height: i64) -> ChainResult<Block<'_>> {
        let len = self.len() as i64;
        let resolved = if height < 0 { height + len } else { height };
        if resolved < 0 || resolved >= len {
            return Err(ChainError::IndexOutOfRange {
                kind: "block height",
                index: height,
                len: self.len(),
            });
        }
        self.block_at_height(resolved as u64)
    }

    /// Blocks selected by `[start:stop:step]` slice semantics (see
    /// [`slice`](crate::slice) for the exact endpoint rules). A negative
    /// step yields blocks in reverse height order.
    pub fn slice(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    ) -> ChainResult<Vec<Block<'_>>> {
        let heights = slice_indices(start, stop, step, self.len())?;
        heights.map(|h| self.block_at_height(h)).collect()
    }

    /// Iterate all blocks in height order. Restartable: each call
    /// produces an independent iterator.
    pub fn iter(&self) -> Blocks<'_> {
        Blocks::new(&self.store, 0, self.len())
    }

    /// Transaction with the given chain-wide dense index. O(1).
    pub fn tx_with_index(&self, index: u32) -> ChainResult<Transaction<'_>> {
        Ok(self.store.transaction(index)?)
    }

    /// Transaction with the given hash; absence is [`ChainError::NotFound`].
    pub fn tx_with_hash(&self, hash: &Hash256) -> ChainResult<Transaction<'_>> {
        let index = self
            .hash_index
            .lookup(hash)
            .and_then(|i| u32::try_from(i).ok())
            .ok_or(ChainError::NotFound(*hash))?;
        match self.store.transaction(index) {
            Ok(tx) => Ok(tx),
            // The hash resolves to a transaction hidden by blocks_ignored.
            Err(StoreError::IndexOutOfRange { .. }) => Err(ChainError::NotFound(*hash)),
            Err(e) => Err(e.into()),
        }
    }

    /// Upper bound on the number of distinct addresses of a type (some
    /// dense indices may alias type-equivalent addresses).
    pub fn address_count(&self, ty: AddressType) -> u64 {
        self.store.address_count(ty)
    }

    /// Script payload of address `(index, ty)`; `index` must be below
    /// [`address_count`](Self::address_count).
    pub fn address_from_index(&self, index: u32, ty: AddressType) -> ChainResult<ScriptVariant<'_>> {
        Ok(self.store.script(index, ty)?)
    }

    /// Parse an address string and look it up.
    ///
    /// A well-formed string the chain has never seen returns `Ok(None)`;
    /// only an unparseable string fails, with
    /// [`ChainError::MalformedAddress`].
    pub fn address_from_string(&self, s: &str) -> ChainResult<Option<ScriptVariant<'_>>> {
        let parsed = parse_address(s)?;
        match self.address_index.lookup(&parsed.canonical) {
            Some(address) => Ok(Some(self.store.script(address.index, address.ty)?)),
            None => Ok(None),
        }
    }

    /// All known addresses whose canonical string starts with `prefix`,
    /// in lexicographic order of their string form. Empty when none match.
    pub fn addresses_with_prefix(&self, prefix: &str) -> ChainResult<Vec<ScriptVariant<'_>>> {
        self.address_index
            .lookup_prefix(prefix)
            .into_iter()
            .map(|address| Ok(self.store.script(address.index, address.ty)?))
            .collect()
    }

    /// Lazily walk every dense address index of a type.
    pub fn addresses(&self, ty: AddressType) -> TypeAddresses<'_> {
        TypeAddresses::new(&self.store, ty)
    }

    /// Lazily walk transactions holding at least one output of a type.
    pub fn address_type_transactions(&self, ty: AddressType) -> TypeTransactions<'_> {
        TypeTransactions::new(&self.store, ty)
    }

    /// Lazily walk every output not consumed by a later input.
    pub fn outputs_unspent(&self) -> UnspentOutputs<'_> {
        UnspentOutputs::new(&self.store)
    }

    /// Height boundaries of `parts` contiguous chunks with approximately
    /// equal transaction counts.
    pub fn segment_indexes(&self, parts: i64) -> ChainResult<Vec<(u64, u64)>> {
        let tx_counts: Vec<u64> = self.iter().map(|b| b.tx_count() as u64).collect();
        segment_boundaries(&tx_counts, parts)
    }

    /// Like [`segment_indexes`](Self::segment_indexes), but binds each
    /// boundary pair to a [`ChainRange`] view over this chain.
    pub fn segment(&self, parts: i64) -> ChainResult<Vec<ChainRange<'_>>> {
        Ok(self
            .segment_indexes(parts)?
            .into_iter()
            .map(|(start, end)| ChainRange::new(self, start, end))
            .collect())
    }

    pub(crate) fn block_at_height(&self, height: u64) -> ChainResult<Block<'_>> {
        Ok(self.store.block(height)?)
    }

    pub(crate) fn store(&self) -> &ChainStore {
        &self.store
    }
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("data_directory", &self.config().data_directory)
            .field("blocks", &self.len())
            .field("txes", &self.tx_count())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Blockchain {
    type Item = Block<'a>;
    type IntoIter = Blocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
