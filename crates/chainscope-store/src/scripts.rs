//! Script payloads and the polymorphic address value.
//!
//! Every [`AddressType`] has exactly one payload shape, stored in that
//! type's script file and decoded here into a [`ScriptVariant`] borrowing
//! the mapped bytes. Match sites are exhaustive over the closed variant
//! set; adding an address type is a compile-time change, not a runtime
//! dispatch gap.
//!
//! Payload shapes:
//! - `Pubkey`: the raw 33- or 65-byte public key
//! - `PubkeyHash` / `ScriptHash` / `WitnessPubkeyHash`: 20-byte hash
//! - `WitnessScriptHash`: 32-byte hash
//! - `Multisig`: `required` (u8), `total` (u8), 20-byte script hash, then
//!   `total` little-endian u32 indices into the `Pubkey` address space
//! - `OpReturn` / `NonStandard`: raw script bytes, no address form

use chainscope_types::encoding::encode_address;
use chainscope_types::AddressType;

use crate::error::{StoreError, StoreResult};
use crate::format::read_u32;

/// Concrete script payload for one address, borrowing the mapped store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptVariant<'a> {
    Pubkey {
        pubkey: &'a [u8],
    },
    PubkeyHash {
        hash: &'a [u8; 20],
    },
    ScriptHash {
        hash: &'a [u8; 20],
    },
    Multisig {
        required: u8,
        total: u8,
        script_hash: &'a [u8; 20],
        pubkey_indexes: Vec<u32>,
    },
    WitnessPubkeyHash {
        hash: &'a [u8; 20],
    },
    WitnessScriptHash {
        hash: &'a [u8; 32],
    },
    OpReturn {
        data: &'a [u8],
    },
    NonStandard {
        script: &'a [u8],
    },
}

impl<'a> ScriptVariant<'a> {
    /// Decode the payload stored for `(ty, index)`.
    pub fn decode(ty: AddressType, index: u32, payload: &'a [u8]) -> StoreResult<Self> {
        let corrupt = |reason: &str| StoreError::CorruptScript {
            ty,
            index,
            reason: reason.into(),
        };
        match ty {
            AddressType::Pubkey => {
                if payload.len() != 33 && payload.len() != 65 {
                    return Err(corrupt("pubkey must be 33 or 65 bytes"));
                }
                Ok(Self::Pubkey { pubkey: payload })
            }
            AddressType::PubkeyHash => Ok(Self::PubkeyHash {
                hash: payload
                    .try_into()
                    .map_err(|_| corrupt("hash must be 20 bytes"))?,
            }),
            AddressType::ScriptHash => Ok(Self::ScriptHash {
                hash: payload
                    .try_into()
                    .map_err(|_| corrupt("hash must be 20 bytes"))?,
            }),
            AddressType::Multisig => {
                if payload.len() < 22 {
                    return Err(corrupt("multisig payload truncated"));
                }
                let required = payload[0];
                let total = payload[1];
                if required == 0 || required > total {
                    return Err(corrupt("invalid m-of-n"));
                }
                if payload.len() != 22 + total as usize * 4 {
                    return Err(corrupt("pubkey index table length mismatch"));
                }
                let script_hash = payload[2..22].try_into().unwrap();
                let pubkey_indexes = (0..total as usize)
                    .map(|i| read_u32(payload, 22 + i * 4))
                    .collect();
                Ok(Self::Multisig {
                    required,
                    total,
                    script_hash,
                    pubkey_indexes,
                })
            }
            AddressType::WitnessPubkeyHash => Ok(Self::WitnessPubkeyHash {
                hash: payload
                    .try_into()
                    .map_err(|_| corrupt("hash must be 20 bytes"))?,
            }),
            AddressType::WitnessScriptHash => Ok(Self::WitnessScriptHash {
                hash: payload
                    .try_into()
                    .map_err(|_| corrupt("hash must be 32 bytes"))?,
            }),
            AddressType::OpReturn => Ok(Self::OpReturn { data: payload }),
            AddressType::NonStandard => Ok(Self::NonStandard { script: payload }),
        }
    }

    /// The type this variant lives under.
    pub fn address_type(&self) -> AddressType {
        match self {
            Self::Pubkey { .. } => AddressType::Pubkey,
            Self::PubkeyHash { .. } => AddressType::PubkeyHash,
            Self::ScriptHash { .. } => AddressType::ScriptHash,
            Self::Multisig { .. } => AddressType::Multisig,
            Self::WitnessPubkeyHash { .. } => AddressType::WitnessPubkeyHash,
            Self::WitnessScriptHash { .. } => AddressType::WitnessScriptHash,
            Self::OpReturn { .. } => AddressType::OpReturn,
            Self::NonStandard { .. } => AddressType::NonStandard,
        }
    }

    /// Canonical string form, `None` for types without one.
    ///
    /// The returned string round-trips through
    /// [`chainscope_types::parse_address`] and is the exact key stored in
    /// the address index.
    pub fn address_string(&self) -> Option<String> {
        match self {
            Self::Pubkey { pubkey } => encode_address(AddressType::Pubkey, pubkey),
            Self::PubkeyHash { hash } => encode_address(AddressType::PubkeyHash, *hash),
            Self::ScriptHash { hash } => encode_address(AddressType::ScriptHash, *hash),
            Self::Multisig { script_hash, .. } => {
                encode_address(AddressType::Multisig, *script_hash)
            }
            Self::WitnessPubkeyHash { hash } => {
                encode_address(AddressType::WitnessPubkeyHash, *hash)
            }
            Self::WitnessScriptHash { hash } => {
                encode_address(AddressType::WitnessScriptHash, *hash)
            }
            Self::OpReturn { .. } | Self::NonStandard { .. } => None,
        }
    }
}

/// Assemble a multisig payload (builder-side inverse of `decode`).
pub(crate) fn encode_multisig(
    required: u8,
    script_hash: &[u8; 20],
    pubkey_indexes: &[u32],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(22 + pubkey_indexes.len() * 4);
    buf.push(required);
    buf.push(pubkey_indexes.len() as u8);
    buf.extend_from_slice(script_hash);
    for index in pubkey_indexes {
        buf.extend_from_slice(&index.to_le_bytes());
    }
    buf
}
