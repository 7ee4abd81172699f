use std::collections::BTreeMap;
use std::path::Path;

use chainscope_types::{AddressType, Hash256};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::layout;

pub const MANIFEST_VERSION: u32 = 1;

/// Dataset manifest: the record counts every file must agree with, the
/// chain tip hash, and the per-type address counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub block_count: u64,
    pub tx_count: u64,
    pub input_count: u64,
    pub output_count: u64,
    pub tip_hash: Hash256,
    /// Dense index counts keyed by `AddressType::label()`.
    pub address_counts: BTreeMap<String, u64>,
}

impl Manifest {
    /// Load and validate `manifest.json` from a dataset directory.
    pub fn load(dir: &Path) -> StoreResult<Self> {
        let path = layout::manifest_file(dir);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::Missing(path.clone()),
            _ => StoreError::Io(e),
        })?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path,
                version: manifest.version,
            });
        }
        Ok(manifest)
    }

    /// Write `manifest.json` into a dataset directory.
    pub fn save(&self, dir: &Path) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| StoreError::CorruptFile {
            path: layout::manifest_file(dir),
            reason: e.to_string(),
        })?;
        std::fs::write(layout::manifest_file(dir), bytes)?;
        Ok(())
    }

    /// Number of dense indices allocated for an address type.
    pub fn address_count(&self, ty: AddressType) -> u64 {
        self.address_counts.get(ty.label()).copied().unwrap_or(0)
    }
}
