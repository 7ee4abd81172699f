//! Fixed-width record layouts for the chain files.
//!
//! Decoding assumes the slice width was already validated by the
//! containing [`RecordFile`](crate::format::RecordFile); the only field
//! that can still be semantically invalid is an address type code, which
//! is resolved lazily by the entities layer.

use chainscope_types::Hash256;

use crate::format::{read_u32, read_u64};

pub const BLOCK_RECORD_WIDTH: u32 = 80;
pub const TX_RECORD_WIDTH: u32 = 64;
pub const INPUT_RECORD_WIDTH: u32 = 24;
pub const OUTPUT_RECORD_WIDTH: u32 = 20;

/// Sentinel in `OutputRecord::spending_tx` marking an unspent output.
pub const SPENDING_NONE: u32 = u32::MAX;

fn hash_at(bytes: &[u8], offset: usize) -> Hash256 {
    let arr: [u8; 32] = bytes[offset..offset + 32].try_into().unwrap();
    Hash256::new(arr)
}

/// One block: 32B hash, 32B parent hash, first transaction index,
/// transaction count, timestamp, 4 reserved bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    pub hash: Hash256,
    pub prev_hash: Hash256,
    pub first_tx: u32,
    pub tx_count: u32,
    pub time: u32,
}

impl BlockRecord {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            hash: hash_at(bytes, 0),
            prev_hash: hash_at(bytes, 32),
            first_tx: read_u32(bytes, 64),
            tx_count: read_u32(bytes, 68),
            time: read_u32(bytes, 72),
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(self.prev_hash.as_bytes());
        buf.extend_from_slice(&self.first_tx.to_le_bytes());
        buf.extend_from_slice(&self.tx_count.to_le_bytes());
        buf.extend_from_slice(&self.time.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
    }
}

/// One transaction: 32B hash, first input/output offsets, counts, owning
/// block height, locktime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxRecord {
    pub hash: Hash256,
    pub first_input: u64,
    pub first_output: u64,
    pub input_count: u32,
    pub output_count: u32,
    pub block_height: u32,
    pub locktime: u32,
}

impl TxRecord {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            hash: hash_at(bytes, 0),
            first_input: read_u64(bytes, 32),
            first_output: read_u64(bytes, 40),
            input_count: read_u32(bytes, 48),
            output_count: read_u32(bytes, 52),
            block_height: read_u32(bytes, 56),
            locktime: read_u32(bytes, 60),
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.first_input.to_le_bytes());
        buf.extend_from_slice(&self.first_output.to_le_bytes());
        buf.extend_from_slice(&self.input_count.to_le_bytes());
        buf.extend_from_slice(&self.output_count.to_le_bytes());
        buf.extend_from_slice(&self.block_height.to_le_bytes());
        buf.extend_from_slice(&self.locktime.to_le_bytes());
    }
}

/// One output: value, address identity, and the transaction that spends
/// it ([`SPENDING_NONE`] while unspent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    pub value: u64,
    pub address_index: u32,
    pub address_code: u8,
    pub spending_tx: u32,
}

impl OutputRecord {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            value: read_u64(bytes, 0),
            address_index: read_u32(bytes, 8),
            address_code: bytes[12],
            spending_tx: read_u32(bytes, 16),
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        buf.extend_from_slice(&self.address_index.to_le_bytes());
        buf.push(self.address_code);
        buf.extend_from_slice(&[0u8; 3]);
        buf.extend_from_slice(&self.spending_tx.to_le_bytes());
    }
}

/// One input: provenance of the consumed output plus a denormalized copy
/// of its value and address, so spend scans need no second lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputRecord {
    pub spent_tx: u32,
    pub spent_output: u32,
    pub value: u64,
    pub address_index: u32,
    pub address_code: u8,
}

impl InputRecord {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            spent_tx: read_u32(bytes, 0),
            spent_output: read_u32(bytes, 4),
            value: read_u64(bytes, 8),
            address_index: read_u32(bytes, 16),
            address_code: bytes[20],
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.spent_tx.to_le_bytes());
        buf.extend_from_slice(&self.spent_output.to_le_bytes());
        buf.extend_from_slice(&self.value.to_le_bytes());
        buf.extend_from_slice(&self.address_index.to_le_bytes());
        buf.push(self.address_code);
        buf.extend_from_slice(&[0u8; 3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_record_roundtrip() {
        let record = BlockRecord {
            hash: Hash256::new([1; 32]),
            prev_hash: Hash256::new([2; 32]),
            first_tx: 100,
            tx_count: 7,
            time: 1_600_000_000,
        };
        let mut buf = Vec::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), BLOCK_RECORD_WIDTH as usize);
        assert_eq!(BlockRecord::decode(&buf), record);
    }

    #[test]
    fn tx_record_roundtrip() {
        let record = TxRecord {
            hash: Hash256::new([3; 32]),
            first_input: 1 << 40,
            first_output: 9,
            input_count: 2,
            output_count: 3,
            block_height: 812_000,
            locktime: 0,
        };
        let mut buf = Vec::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), TX_RECORD_WIDTH as usize);
        assert_eq!(TxRecord::decode(&buf), record);
    }

    #[test]
    fn output_record_roundtrip() {
        let record = OutputRecord {
            value: 5_000_000_000,
            address_index: 42,
            address_code: 1,
            spending_tx: SPENDING_NONE,
        };
        let mut buf = Vec::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), OUTPUT_RECORD_WIDTH as usize);
        assert_eq!(OutputRecord::decode(&buf), record);
    }

    #[test]
    fn input_record_roundtrip() {
        let record = InputRecord {
            spent_tx: 17,
            spent_output: 1,
            value: 123_456,
            address_index: 9,
            address_code: 4,
        };
        let mut buf = Vec::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), INPUT_RECORD_WIDTH as usize);
        assert_eq!(InputRecord::decode(&buf), record);
    }
}
