use std::fmt;
use std::path::Path;

use chainscope_types::AddressType;

use crate::config::DataConfiguration;
use crate::entities::{Block, Input, Output, Transaction};
use crate::error::{StoreError, StoreResult};
use crate::format::{
    RecordFile, VarFile, BLOCKS_MAGIC, INPUTS_MAGIC, OUTPUTS_MAGIC, SCRIPTS_MAGIC, TXES_MAGIC,
};
use crate::layout;
use crate::manifest::Manifest;
use crate::records::{
    BlockRecord, InputRecord, OutputRecord, TxRecord, BLOCK_RECORD_WIDTH, INPUT_RECORD_WIDTH,
    OUTPUT_RECORD_WIDTH, TX_RECORD_WIDTH,
};
use crate::scripts::ScriptVariant;

/// Trailing blocks whose parent linkage is verified when
/// `error_on_reorg` is set. A reorg deeper than this did not happen on
/// the chains this engine targets.
pub const REORG_CHECK_WINDOW: u64 = 144;

/// Fixed payload width for an address type's script file, if it has one.
pub(crate) fn script_fixed_width(ty: AddressType) -> Option<u32> {
    match ty {
        AddressType::PubkeyHash
        | AddressType::ScriptHash
        | AddressType::WitnessPubkeyHash => Some(20),
        AddressType::WitnessScriptHash => Some(32),
        AddressType::Pubkey
        | AddressType::Multisig
        | AddressType::OpReturn
        | AddressType::NonStandard => None,
    }
}

enum ScriptFile {
    Fixed(RecordFile),
    Var(VarFile),
}

impl ScriptFile {
    fn open(dir: &Path, ty: AddressType) -> StoreResult<Self> {
        let path = layout::scripts_file(dir, ty);
        match script_fixed_width(ty) {
            Some(width) => Ok(Self::Fixed(RecordFile::open(&path, SCRIPTS_MAGIC, width)?)),
            None => Ok(Self::Var(VarFile::open(&path, SCRIPTS_MAGIC)?)),
        }
    }

    fn count(&self) -> u64 {
        match self {
            Self::Fixed(file) => file.count(),
            Self::Var(file) => file.count(),
        }
    }

    fn record(&self, i: u64) -> &[u8] {
        match self {
            Self::Fixed(file) => file.record(i),
            Self::Var(file) => file.record(i),
        }
    }

    fn verify_crc(&self) -> StoreResult<()> {
        match self {
            Self::Fixed(file) => file.verify_crc(),
            Self::Var(file) => file.verify_crc(),
        }
    }
}

/// The opened, immutable chain dataset.
///
/// All files are mapped read-only at open; every accessor afterwards is a
/// lock-free read. `ChainStore` is `Send + Sync`; any number of threads
/// may query one store concurrently.
pub struct ChainStore {
    config: DataConfiguration,
    manifest: Manifest,
    blocks: RecordFile,
    txes: RecordFile,
    inputs: RecordFile,
    outputs: RecordFile,
    /// Indexed by `AddressType::code()`.
    scripts: Vec<ScriptFile>,
    visible_blocks: u64,
    visible_txes: u64,
    visible_inputs: u64,
    visible_outputs: u64,
}

impl ChainStore {
    /// Open a dataset read-only.
    ///
    /// Validates every file header and the cross-file counts against the
    /// manifest, applies `blocks_ignored`, and, when `error_on_reorg` is
    /// set, checks the tip and trailing parent linkage. Open is O(1) in
    /// the data size; no record payload is read eagerly.
    pub fn open(config: &DataConfiguration) -> StoreResult<Self> {
        let dir = config.data_directory.as_path();
        tracing::debug!(?dir, "opening chain store");
        if !dir.is_dir() {
            return Err(StoreError::Missing(dir.to_path_buf()));
        }

        let manifest = Manifest::load(dir)?;
        let blocks = RecordFile::open(&layout::blocks_file(dir), BLOCKS_MAGIC, BLOCK_RECORD_WIDTH)?;
        let txes = RecordFile::open(&layout::txes_file(dir), TXES_MAGIC, TX_RECORD_WIDTH)?;
        let inputs = RecordFile::open(&layout::inputs_file(dir), INPUTS_MAGIC, INPUT_RECORD_WIDTH)?;
        let outputs =
            RecordFile::open(&layout::outputs_file(dir), OUTPUTS_MAGIC, OUTPUT_RECORD_WIDTH)?;

        let counts = [
            ("block", blocks.count(), manifest.block_count),
            ("transaction", txes.count(), manifest.tx_count),
            ("input", inputs.count(), manifest.input_count),
            ("output", outputs.count(), manifest.output_count),
        ];
        for (kind, actual, expected) in counts {
            if actual != expected {
                return Err(StoreError::Inconsistent(format!(
                    "{kind} file holds {actual} records, manifest says {expected}"
                )));
            }
        }

        let mut scripts = Vec::with_capacity(AddressType::ALL.len());
        for ty in AddressType::ALL {
            let file = ScriptFile::open(dir, ty)?;
            let expected = manifest.address_count(ty);
            if file.count() != expected {
                return Err(StoreError::Inconsistent(format!(
                    "{ty} script file holds {} records, manifest says {expected}",
                    file.count()
                )));
            }
            scripts.push(file);
        }

        if config.error_on_reorg {
            Self::check_reorg(&blocks, &manifest)?;
        }

        let visible_blocks = blocks.count().saturating_sub(config.blocks_ignored as u64);
        let (visible_txes, visible_inputs, visible_outputs) = if visible_blocks == 0 {
            (0, 0, 0)
        } else {
            let last_block = BlockRecord::decode(blocks.record(visible_blocks - 1));
            let visible_txes = last_block.first_tx as u64 + last_block.tx_count as u64;
            if visible_txes == 0 {
                (0, 0, 0)
            } else {
                let last_tx = TxRecord::decode(txes.record(visible_txes - 1));
                (
                    visible_txes,
                    last_tx.first_input + last_tx.input_count as u64,
                    last_tx.first_output + last_tx.output_count as u64,
                )
            }
        };

        tracing::info!(
            blocks = visible_blocks,
            txes = visible_txes,
            ignored = config.blocks_ignored,
            "opened chain store"
        );

        Ok(Self {
            config: config.clone(),
            manifest,
            blocks,
            txes,
            inputs,
            outputs,
            scripts,
            visible_blocks,
            visible_txes,
            visible_inputs,
            visible_outputs,
        })
    }

    /// Verify the manifest tip and trailing parent linkage.
    fn check_reorg(blocks: &RecordFile, manifest: &Manifest) -> StoreResult<()> {
        let stored = blocks.count();
        if stored == 0 {
            return Ok(());
        }
        let tip = BlockRecord::decode(blocks.record(stored - 1));
        if tip.hash != manifest.tip_hash {
            return Err(StoreError::ReorgDetected {
                height: stored - 1,
                expected: manifest.tip_hash,
                actual: tip.hash,
            });
        }
        let start = stored.saturating_sub(REORG_CHECK_WINDOW).max(1);
        let mut parent = BlockRecord::decode(blocks.record(start - 1));
        for height in start..stored {
            let block = BlockRecord::decode(blocks.record(height));
            if block.prev_hash != parent.hash {
                return Err(StoreError::ReorgDetected {
                    height,
                    expected: parent.hash,
                    actual: block.prev_hash,
                });
            }
            parent = block;
        }
        Ok(())
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &DataConfiguration {
        &self.config
    }

    /// The dataset manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Visible block count (stored count minus ignored trailing blocks).
    pub fn block_count(&self) -> u64 {
        self.visible_blocks
    }

    /// Visible transaction count.
    pub fn tx_count(&self) -> u64 {
        self.visible_txes
    }

    /// Visible input count.
    pub fn input_count(&self) -> u64 {
        self.visible_inputs
    }

    /// Visible output count.
    pub fn output_count(&self) -> u64 {
        self.visible_outputs
    }

    /// Upper bound on distinct addresses of a type (dense index count).
    pub fn address_count(&self, ty: AddressType) -> u64 {
        self.manifest.address_count(ty)
    }

    /// Block at `height`.
    pub fn block(&self, height: u64) -> StoreResult<Block<'_>> {
        if height >= self.visible_blocks {
            return Err(StoreError::IndexOutOfRange {
                kind: "block height",
                index: height,
                len: self.visible_blocks,
            });
        }
        Ok(self.block_unchecked(height))
    }

    /// Transaction with the given chain-wide dense index.
    pub fn transaction(&self, index: u32) -> StoreResult<Transaction<'_>> {
        if index as u64 >= self.visible_txes {
            return Err(StoreError::IndexOutOfRange {
                kind: "transaction",
                index: index as u64,
                len: self.visible_txes,
            });
        }
        Ok(self.transaction_unchecked(index))
    }

    /// Output with the given chain-wide dense index.
    pub fn output(&self, index: u64) -> StoreResult<Output<'_>> {
        if index >= self.visible_outputs {
            return Err(StoreError::IndexOutOfRange {
                kind: "output",
                index,
                len: self.visible_outputs,
            });
        }
        Ok(self.output_unchecked(index))
    }

    /// Input with the given chain-wide dense index.
    pub fn input(&self, index: u64) -> StoreResult<Input<'_>> {
        if index >= self.visible_inputs {
            return Err(StoreError::IndexOutOfRange {
                kind: "input",
                index,
                len: self.visible_inputs,
            });
        }
        Ok(self.input_unchecked(index))
    }

    /// Resolve the script payload for address `(index, ty)`.
    pub fn script(&self, index: u32, ty: AddressType) -> StoreResult<ScriptVariant<'_>> {
        let count = self.address_count(ty);
        if index as u64 >= count {
            return Err(StoreError::IndexOutOfRange {
                kind: "address",
                index: index as u64,
                len: count,
            });
        }
        let payload = self.scripts[ty.code() as usize].record(index as u64);
        ScriptVariant::decode(ty, index, payload)
    }

    /// Re-hash every file payload against its header CRC.
    ///
    /// This touches the whole dataset; it is a tool for integrity sweeps
    /// and tests, not part of the open path.
    pub fn verify(&self) -> StoreResult<()> {
        self.blocks.verify_crc()?;
        self.txes.verify_crc()?;
        self.inputs.verify_crc()?;
        self.outputs.verify_crc()?;
        for file in &self.scripts {
            file.verify_crc()?;
        }
        Ok(())
    }

    pub(crate) fn block_unchecked(&self, height: u64) -> Block<'_> {
        Block::new(self, height, BlockRecord::decode(self.blocks.record(height)))
    }

    pub(crate) fn transaction_unchecked(&self, index: u32) -> Transaction<'_> {
        Transaction::new(
            self,
            index,
            TxRecord::decode(self.txes.record(index as u64)),
        )
    }

    pub(crate) fn output_unchecked(&self, index: u64) -> Output<'_> {
        Output::new(self, index, OutputRecord::decode(self.outputs.record(index)))
    }

    pub(crate) fn input_unchecked(&self, index: u64) -> Input<'_> {
        Input::new(self, index, InputRecord::decode(self.inputs.record(index)))
    }
}

impl fmt::Debug for ChainStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainStore")
            .field("data_directory", &self.config.data_directory)
            .field("blocks", &self.visible_blocks)
            .field("txes", &self.visible_txes)
            .finish()
    }
}
