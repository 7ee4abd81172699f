use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed enumeration of on-chain script/address encodings.
///
/// Address indices are dense and type-scoped: the same integer index names
/// different addresses under different types. Adding a variant here is a
/// compile-time exhaustiveness failure at every match site, which is the
/// point: there is no open-ended dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressType {
    /// Pay-to-pubkey: the raw public key is on chain.
    Pubkey,
    /// Pay-to-pubkey-hash.
    PubkeyHash,
    /// Pay-to-script-hash.
    ScriptHash,
    /// Bare m-of-n multisignature.
    Multisig,
    /// Witness v0 pay-to-witness-pubkey-hash.
    WitnessPubkeyHash,
    /// Witness v0 pay-to-witness-script-hash.
    WitnessScriptHash,
    /// Provably unspendable data carrier output.
    OpReturn,
    /// Anything the parser could not classify.
    NonStandard,
}

impl AddressType {
    /// Every variant, in stable wire-code order.
    pub const ALL: [AddressType; 8] = [
        AddressType::Pubkey,
        AddressType::PubkeyHash,
        AddressType::ScriptHash,
        AddressType::Multisig,
        AddressType::WitnessPubkeyHash,
        AddressType::WitnessScriptHash,
        AddressType::OpReturn,
        AddressType::NonStandard,
    ];

    /// Stable on-disk code. Never reorder these.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pubkey => 0,
            Self::PubkeyHash => 1,
            Self::ScriptHash => 2,
            Self::Multisig => 3,
            Self::WitnessPubkeyHash => 4,
            Self::WitnessScriptHash => 5,
            Self::OpReturn => 6,
            Self::NonStandard => 7,
        }
    }

    /// Decode an on-disk code.
    pub fn from_code(code: u8) -> Option<Self> {
        AddressType::ALL.get(code as usize).copied()
    }

    /// Stable name used for script file names and manifest keys.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pubkey => "pubkey",
            Self::PubkeyHash => "pubkey_hash",
            Self::ScriptHash => "script_hash",
            Self::Multisig => "multisig",
            Self::WitnessPubkeyHash => "witness_pubkey_hash",
            Self::WitnessScriptHash => "witness_script_hash",
            Self::OpReturn => "op_return",
            Self::NonStandard => "non_standard",
        }
    }

    /// Reverse of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<Self> {
        AddressType::ALL.iter().copied().find(|t| t.label() == label)
    }

    /// The textual address tag, for types that have a canonical string form.
    ///
    /// `OpReturn` and `NonStandard` outputs carry no address encoding, so
    /// they have no tag and never appear in the address index.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Pubkey => Some("pk"),
            Self::PubkeyHash => Some("pkh"),
            Self::ScriptHash => Some("sh"),
            Self::Multisig => Some("ms"),
            Self::WitnessPubkeyHash => Some("wpkh"),
            Self::WitnessScriptHash => Some("wsh"),
            Self::OpReturn | Self::NonStandard => None,
        }
    }

    /// Reverse of [`tag`](Self::tag).
    pub fn from_tag(tag: &str) -> Option<Self> {
        AddressType::ALL.iter().copied().find(|t| t.tag() == Some(tag))
    }

    /// Returns `true` if addresses of this type have a string form.
    pub fn is_encodable(&self) -> bool {
        self.tag().is_some()
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identity of an address: a dense per-type integer index plus its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Dense, zero-based index scoped to `ty`.
    pub index: u32,
    /// The script encoding this index lives under.
    pub ty: AddressType,
}

impl Address {
    /// Create an address identity.
    pub fn new(index: u32, ty: AddressType) -> Self {
        Self { index, ty }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ty.label(), self.index)
    }
}
