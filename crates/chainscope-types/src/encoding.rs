//! Canonical textual address form: `<tag>:<lowercase hex payload>`.
//!
//! Payload lengths are fixed per type (`pkh`/`sh`/`ms`/`wpkh` carry a
//! 20-byte hash, `wsh` a 32-byte hash, `pk` a 33- or 65-byte public key).
//! The canonical form is what the address index stores as its key, so
//! parsing here and rendering in the script layer must stay in lock-step.

use crate::address::AddressType;
use crate::error::TypeError;

/// Outcome of parsing an address string: the detected type plus the
/// canonicalized (lowercased) form used as an index key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedAddress {
    pub ty: AddressType,
    pub canonical: String,
}

/// Accepted payload lengths for a type's textual form, in bytes.
fn payload_lengths(ty: AddressType) -> &'static [usize] {
    match ty {
        AddressType::Pubkey => &[33, 65],
        AddressType::PubkeyHash
        | AddressType::ScriptHash
        | AddressType::Multisig
        | AddressType::WitnessPubkeyHash => &[20],
        AddressType::WitnessScriptHash => &[32],
        AddressType::OpReturn | AddressType::NonStandard => &[],
    }
}

/// Parse an address string into its type and canonical form.
///
/// Fails with [`TypeError::MalformedAddress`] when the string does not
/// match any known encoding; it does NOT consult any index; a well-formed
/// string for an address the chain has never seen still parses.
pub fn parse_address(s: &str) -> Result<ParsedAddress, TypeError> {
    let (tag, payload_hex) = s
        .split_once(':')
        .ok_or_else(|| TypeError::MalformedAddress(format!("missing tag separator: {s:?}")))?;

    let ty = AddressType::from_tag(tag)
        .ok_or_else(|| TypeError::MalformedAddress(format!("unknown address tag: {tag:?}")))?;

    let payload = hex::decode(payload_hex)
        .map_err(|_| TypeError::MalformedAddress(format!("payload is not hex: {s:?}")))?;

    if !payload_lengths(ty).contains(&payload.len()) {
        return Err(TypeError::MalformedAddress(format!(
            "bad payload length {} for {tag} address",
            payload.len()
        )));
    }

    Ok(ParsedAddress {
        ty,
        canonical: format!("{tag}:{}", hex::encode(&payload)),
    })
}

/// Render the canonical string form for a type and payload.
///
/// Returns `None` for types without a textual encoding, or when the
/// payload length does not fit the type.
pub fn encode_address(ty: AddressType, payload: &[u8]) -> Option<String> {
    let tag = ty.tag()?;
    if !payload_lengths(ty).contains(&payload.len()) {
        return None;
    }
    Some(format!("{tag}:{}", hex::encode(payload)))
}
