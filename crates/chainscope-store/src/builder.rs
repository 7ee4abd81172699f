//! Offline dataset writer.
//!
//! `StoreBuilder` assembles a complete dataset in memory -- blocks,
//! transactions, interned script payloads, both index tables, and the
//! manifest -- and writes it in one pass. It is the stand-in for the
//! upstream parser in tests and the reference implementation of the
//! on-disk write contract; the read engine never invokes it after open.

use std::collections::HashMap;
use std::path::Path;

use chainscope_index::{AddressIndex, HashIndex};
use chainscope_types::{Address, AddressType, Hash256};

use crate::error::{StoreError, StoreResult};
use crate::format::{
    file_bytes, var_payload, BLOCKS_MAGIC, INPUTS_MAGIC, OUTPUTS_MAGIC, SCRIPTS_MAGIC, TXES_MAGIC,
};
use crate::layout;
use crate::manifest::{Manifest, MANIFEST_VERSION};
use crate::records::{
    BlockRecord, InputRecord, OutputRecord, TxRecord, BLOCK_RECORD_WIDTH, INPUT_RECORD_WIDTH,
    OUTPUT_RECORD_WIDTH, SPENDING_NONE, TX_RECORD_WIDTH,
};
use crate::scripts::{encode_multisig, ScriptVariant};

/// Script attached to an output under construction.
#[derive(Clone, Debug)]
pub enum ScriptSpec {
    /// Raw 33- or 65-byte public key.
    Pubkey(Vec<u8>),
    PubkeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    /// `required`-of-`pubkeys.len()` multisig; the pubkeys are interned
    /// as `Pubkey` addresses of their own.
    Multisig {
        required: u8,
        script_hash: [u8; 20],
        pubkeys: Vec<Vec<u8>>,
    },
    WitnessPubkeyHash([u8; 20]),
    WitnessScriptHash([u8; 32]),
    OpReturn(Vec<u8>),
    NonStandard(Vec<u8>),
}

/// In-memory dataset under construction.
#[derive(Default)]
pub struct StoreBuilder {
    blocks: Vec<BlockRecord>,
    txes: Vec<TxRecord>,
    inputs: Vec<InputRecord>,
    outputs: Vec<OutputRecord>,
    /// Payloads per address type, indexed by `AddressType::code()`.
    scripts: [Vec<Vec<u8>>; 8],
    intern: HashMap<(u8, Vec<u8>), u32>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new block chained to the previous one (or to the null hash
    /// for the genesis block).
    pub fn begin_block(&mut self, hash: Hash256, time: u32) {
        let prev = self.blocks.last().map(|b| b.hash).unwrap_or(Hash256::null());
        self.begin_block_with_prev(hash, prev, time);
    }

    /// Start a new block with an explicit parent hash, so tests can
    /// fabricate broken linkage.
    pub fn begin_block_with_prev(&mut self, hash: Hash256, prev: Hash256, time: u32) {
        self.blocks.push(BlockRecord {
            hash,
            prev_hash: prev,
            first_tx: self.txes.len() as u32,
            tx_count: 0,
            time,
        });
    }

    /// Append a transaction to the current block. Returns its dense index.
    pub fn add_tx(&mut self, hash: Hash256) -> StoreResult<u32> {
        let height = self.blocks.len() as u32;
        let block = self
            .blocks
            .last_mut()
            .ok_or_else(|| StoreError::InvalidFixture("transaction outside any block".into()))?;
        let index = self.txes.len() as u32;
        self.txes.push(TxRecord {
            hash,
            first_input: self.inputs.len() as u64,
            first_output: self.outputs.len() as u64,
            input_count: 0,
            output_count: 0,
            block_height: height - 1,
            locktime: 0,
        });
        block.tx_count += 1;
        Ok(index)
    }

    /// Append an output to the current transaction. Returns `(tx, vout)`.
    pub fn add_output(&mut self, value: u64, script: ScriptSpec) -> StoreResult<(u32, u32)> {
        if self.txes.is_empty() {
            return Err(StoreError::InvalidFixture("output outside any transaction".into()));
        }
        let (code, address_index) = self.intern_script(script)?;
        let tx_index = (self.txes.len() - 1) as u32;
        let tx = self.txes.last_mut().unwrap();
        let vout = tx.output_count;
        tx.output_count += 1;
        self.outputs.push(OutputRecord {
            value,
            address_index,
            address_code: code,
            spending_tx: SPENDING_NONE,
        });
        Ok((tx_index, vout))
    }

    /// Append an input to the current transaction, consuming output
    /// `vout` of the earlier transaction `spent_tx`.
    pub fn add_input(&mut self, spent_tx: u32, vout: u32) -> StoreResult<()> {
        if self.txes.is_empty() {
            return Err(StoreError::InvalidFixture("input outside any transaction".into()));
        }
        let spender = (self.txes.len() - 1) as u32;
        if spent_tx >= spender {
            return Err(StoreError::InvalidFixture(format!(
                "input of tx {spender} references non-earlier tx {spent_tx}"
            )));
        }
        let spent = self.txes[spent_tx as usize];
        if vout >= spent.output_count {
            return Err(StoreError::InvalidFixture(format!(
                "tx {spent_tx} has no output {vout}"
            )));
        }
        let output_index = spent.first_output as usize + vout as usize;
        let output = &mut self.outputs[output_index];
        if output.spending_tx != SPENDING_NONE {
            return Err(StoreError::InvalidFixture(format!(
                "output {spent_tx}:{vout} is already spent by tx {}",
                output.spending_tx
            )));
        }
        output.spending_tx = spender;

        let record = InputRecord {
            spent_tx,
            spent_output: vout,
            value: output.value,
            address_index: output.address_index,
            address_code: output.address_code,
        };
        self.inputs.push(record);
        self.txes.last_mut().unwrap().input_count += 1;
        Ok(())
    }

    /// Intern a script payload, returning its `(type code, dense index)`.
    fn intern_script(&mut self, spec: ScriptSpec) -> StoreResult<(u8, u32)> {
        let (ty, payload) = match spec {
            ScriptSpec::Pubkey(pubkey) => {
                if pubkey.len() != 33 && pubkey.len() != 65 {
                    return Err(StoreError::InvalidFixture(format!(
                        "pubkey must be 33 or 65 bytes, got {}",
                        pubkey.len()
                    )));
                }
                (AddressType::Pubkey, pubkey)
            }
            ScriptSpec::PubkeyHash(hash) => (AddressType::PubkeyHash, hash.to_vec()),
            ScriptSpec::ScriptHash(hash) => (AddressType::ScriptHash, hash.to_vec()),
            ScriptSpec::Multisig {
                required,
                script_hash,
                pubkeys,
            } => {
                if pubkeys.is_empty() || pubkeys.len() > u8::MAX as usize {
                    return Err(StoreError::InvalidFixture(
                        "multisig needs between 1 and 255 pubkeys".into(),
                    ));
                }
                if required == 0 || required as usize > pubkeys.len() {
                    return Err(StoreError::InvalidFixture(format!(
                        "invalid {required}-of-{} multisig",
                        pubkeys.len()
                    )));
                }
                let mut indexes = Vec::with_capacity(pubkeys.len());
                for pubkey in pubkeys {
                    let (_, index) = self.intern_script(ScriptSpec::Pubkey(pubkey))?;
                    indexes.push(index);
                }
                (
                    AddressType::Multisig,
                    encode_multisig(required, &script_hash, &indexes),
                )
            }
            ScriptSpec::WitnessPubkeyHash(hash) => (AddressType::WitnessPubkeyHash, hash.to_vec()),
            ScriptSpec::WitnessScriptHash(hash) => (AddressType::WitnessScriptHash, hash.to_vec()),
            ScriptSpec::OpReturn(data) => (AddressType::OpReturn, data),
            ScriptSpec::NonStandard(script) => (AddressType::NonStandard, script),
        };

        let code = ty.code();
        if let Some(&index) = self.intern.get(&(code, payload.clone())) {
            return Ok((code, index));
        }
        let pool = &mut self.scripts[code as usize];
        let index = pool.len() as u32;
        pool.push(payload.clone());
        self.intern.insert((code, payload), index);
        Ok((code, index))
    }

    /// Write the complete dataset layout into `dir`.
    pub fn write(&self, dir: &Path) -> StoreResult<()> {
        std::fs::create_dir_all(dir.join("chain"))?;
        std::fs::create_dir_all(dir.join("scripts"))?;
        std::fs::create_dir_all(dir.join("index"))?;

        let mut payload = Vec::new();
        for record in &self.blocks {
            record.encode(&mut payload);
        }
        std::fs::write(
            layout::blocks_file(dir),
            file_bytes(BLOCKS_MAGIC, BLOCK_RECORD_WIDTH, self.blocks.len() as u64, &payload),
        )?;

        let mut payload = Vec::new();
        for record in &self.txes {
            record.encode(&mut payload);
        }
        std::fs::write(
            layout::txes_file(dir),
            file_bytes(TXES_MAGIC, TX_RECORD_WIDTH, self.txes.len() as u64, &payload),
        )?;

        let mut payload = Vec::new();
        for record in &self.inputs {
            record.encode(&mut payload);
        }
        std::fs::write(
            layout::inputs_file(dir),
            file_bytes(INPUTS_MAGIC, INPUT_RECORD_WIDTH, self.inputs.len() as u64, &payload),
        )?;

        let mut payload = Vec::new();
        for record in &self.outputs {
            record.encode(&mut payload);
        }
        std::fs::write(
            layout::outputs_file(dir),
            file_bytes(OUTPUTS_MAGIC, OUTPUT_RECORD_WIDTH, self.outputs.len() as u64, &payload),
        )?;

        for ty in AddressType::ALL {
            self.write_script_file(dir, ty)?;
        }

        let hash_entries: Vec<(Hash256, u64)> = self
            .txes
            .iter()
            .enumerate()
            .map(|(i, tx)| (tx.hash, i as u64))
            .collect();
        std::fs::write(layout::hash_index_file(dir), HashIndex::build(&hash_entries))?;

        let mut address_entries = Vec::new();
        for ty in AddressType::ALL {
            if !ty.is_encodable() {
                continue;
            }
            for (i, payload) in self.scripts[ty.code() as usize].iter().enumerate() {
                let variant = ScriptVariant::decode(ty, i as u32, payload)?;
                if let Some(key) = variant.address_string() {
                    address_entries.push((key, Address::new(i as u32, ty)));
                }
            }
        }
        std::fs::write(
            layout::address_index_file(dir),
            AddressIndex::build(&address_entries),
        )?;

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            block_count: self.blocks.len() as u64,
            tx_count: self.txes.len() as u64,
            input_count: self.inputs.len() as u64,
            output_count: self.outputs.len() as u64,
            tip_hash: self.blocks.last().map(|b| b.hash).unwrap_or(Hash256::null()),
            address_counts: AddressType::ALL
                .iter()
                .map(|ty| {
                    (
                        ty.label().to_string(),
                        self.scripts[ty.code() as usize].len() as u64,
                    )
                })
                .collect(),
        };
        manifest.save(dir)?;

        tracing::debug!(
            ?dir,
            blocks = self.blocks.len(),
            txes = self.txes.len(),
            addresses = address_entries.len(),
            "wrote dataset"
        );
        Ok(())
    }

    fn write_script_file(&self, dir: &Path, ty: AddressType) -> StoreResult<()> {
        let pool = &self.scripts[ty.code() as usize];
        let path = layout::scripts_file(dir, ty);
        let bytes = match crate::store::script_fixed_width(ty) {
            Some(width) => {
                let mut payload = Vec::new();
                for record in pool {
                    debug_assert_eq!(record.len(), width as usize);
                    payload.extend_from_slice(record);
                }
                file_bytes(SCRIPTS_MAGIC, width, pool.len() as u64, &payload)
            }
            None => {
                let payload = var_payload(pool.iter().map(|r| r.as_slice()));
                file_bytes(SCRIPTS_MAGIC, 0, pool.len() as u64, &payload)
            }
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
