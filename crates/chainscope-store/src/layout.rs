//! File layout of a parsed dataset directory.
//!
//! ```text
//! <data_dir>/
//!   manifest.json
//!   chain/blocks.dat  chain/txes.dat  chain/inputs.dat  chain/outputs.dat
//!   scripts/<type label>.dat
//!   index/tx_hash.idx  index/addresses.idx
//! ```

use std::path::{Path, PathBuf};

use chainscope_types::AddressType;

pub fn manifest_file(dir: &Path) -> PathBuf {
    dir.join("manifest.json")
}

pub fn blocks_file(dir: &Path) -> PathBuf {
    dir.join("chain").join("blocks.dat")
}

pub fn txes_file(dir: &Path) -> PathBuf {
    dir.join("chain").join("txes.dat")
}

pub fn inputs_file(dir: &Path) -> PathBuf {
    dir.join("chain").join("inputs.dat")
}

pub fn outputs_file(dir: &Path) -> PathBuf {
    dir.join("chain").join("outputs.dat")
}

pub fn scripts_file(dir: &Path, ty: AddressType) -> PathBuf {
    dir.join("scripts").join(format!("{}.dat", ty.label()))
}

pub fn hash_index_file(dir: &Path) -> PathBuf {
    dir.join("index").join("tx_hash.idx")
}

pub fn address_index_file(dir: &Path) -> PathBuf {
    dir.join("index").join("addresses.idx")
}
