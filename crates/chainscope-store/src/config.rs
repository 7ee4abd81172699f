use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Immutable description of where a dataset lives and its load-time policy.
///
/// Equality is structural; two configurations are the same configuration
/// exactly when all three fields match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfiguration {
    /// Root directory of the parsed dataset.
    pub data_directory: PathBuf,
    /// Refuse to open when the on-disk tip is inconsistent with the
    /// manifest (a reorg happened under the parser's feet).
    pub error_on_reorg: bool,
    /// Trailing blocks hidden from the visible range as a safety margin.
    pub blocks_ignored: u32,
}

impl DataConfiguration {
    /// Configuration with default policy: no reorg check, no ignored blocks.
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            error_on_reorg: false,
            blocks_ignored: 0,
        }
    }

    /// Serialize to the versioned state form: an ordered 3-element array
    /// `[data_directory, error_on_reorg, blocks_ignored]`.
    pub fn to_state(&self) -> serde_json::Value {
        serde_json::json!([
            self.data_directory.to_string_lossy(),
            self.error_on_reorg,
            self.blocks_ignored,
        ])
    }

    /// Decode the state form produced by [`to_state`](Self::to_state).
    ///
    /// Fails with [`StoreError::MalformedState`] unless the value is
    /// exactly a 3-element array carrying a string, a bool, and an
    /// unsigned integer, in that order.
    pub fn from_state(value: &serde_json::Value) -> StoreResult<Self> {
        let fields = value
            .as_array()
            .ok_or_else(|| StoreError::MalformedState("state must be an array".into()))?;
        if fields.len() != 3 {
            return Err(StoreError::MalformedState(format!(
                "expected 3 fields, got {}",
                fields.len()
            )));
        }
        let data_directory = fields[0]
            .as_str()
            .ok_or_else(|| StoreError::MalformedState("field 0 must be a string".into()))?;
        let error_on_reorg = fields[1]
            .as_bool()
            .ok_or_else(|| StoreError::MalformedState("field 1 must be a bool".into()))?;
        let blocks_ignored = fields[2]
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StoreError::MalformedState("field 2 must be a block count".into()))?;

        Ok(Self {
            data_directory: PathBuf::from(data_directory),
            error_on_reorg,
            blocks_ignored,
        })
    }
}
