use std::path::Path;

use chainscope_types::Hash256;

use crate::error::{IndexError, IndexResult};
use crate::table::{map_file, read_u32, read_u64, TableData};

const MAGIC: &[u8; 4] = b"CSHI";
const VERSION: u32 = 1;

/// Header: magic + version + count.
const HEADER_LEN: usize = 16;
/// Fan-out table: 256 entries counting hashes with first byte <= index.
const FANOUT_LEN: usize = 256 * 4;

/// Maps a transaction hash to its dense index within the chain.
///
/// Layout mirrors git's pack index v2: a 256-entry fan-out table bucketing
/// the sorted hash array by first byte, followed by the parallel array of
/// dense indices. Lookups binary-search one bucket, so they are O(log n)
/// with a single cache-friendly probe sequence. The table is immutable
/// after construction; concurrent reads need no locking.
#[derive(Debug)]
pub struct HashIndex {
    data: TableData,
    count: usize,
}

impl HashIndex {
    /// Map an index file read-only.
    pub fn open(path: &Path) -> IndexResult<Self> {
        Self::validate(map_file(path)?)
    }

    /// Open from an in-memory table (as produced by [`HashIndex::build`]).
    pub fn from_bytes(bytes: Vec<u8>) -> IndexResult<Self> {
        Self::validate(TableData::Owned(bytes))
    }

    fn validate(data: TableData) -> IndexResult<Self> {
        let bytes = data.bytes();
        if bytes.len() < HEADER_LEN + FANOUT_LEN {
            return Err(IndexError::Corrupted("table too short".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(IndexError::InvalidMagic {
                expected: String::from_utf8_lossy(MAGIC).into(),
                actual: String::from_utf8_lossy(&bytes[0..4]).into(),
            });
        }
        let version = read_u32(bytes, 4);
        if version != VERSION {
            return Err(IndexError::UnsupportedVersion(version));
        }
        let count = read_u64(bytes, 8) as usize;

        let expected_len = HEADER_LEN + FANOUT_LEN + count * 32 + count * 8;
        if bytes.len() != expected_len {
            return Err(IndexError::Corrupted(format!(
                "length mismatch: expected {expected_len}, got {}",
                bytes.len()
            )));
        }

        // Fan-out must be monotonic and end at the hash count.
        let mut prev = 0u32;
        for slot in 0..256 {
            let value = read_u32(bytes, HEADER_LEN + slot * 4);
            if value < prev {
                return Err(IndexError::Corrupted("fan-out not monotonic".into()));
            }
            prev = value;
        }
        if prev as usize != count {
            return Err(IndexError::Corrupted("fan-out does not cover count".into()));
        }

        Ok(Self { data, count })
    }

    /// Number of hashes in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Look up the dense index for a hash.
    pub fn lookup(&self, hash: &Hash256) -> Option<u64> {
        let key = hash.as_bytes();
        let first = key[0] as usize;
        let start = if first == 0 { 0 } else { self.fanout(first - 1) };
        let end = self.fanout(first);

        let mut lo = start;
        let mut hi = end;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.hash_at(mid).cmp(key.as_slice()) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(self.index_at(mid)),
            }
        }
        None
    }

    /// Check whether a hash is present.
    pub fn contains(&self, hash: &Hash256) -> bool {
        self.lookup(hash).is_some()
    }

    /// Serialize a table from (hash, dense index) entries.
    pub fn build(entries: &[(Hash256, u64)]) -> Vec<u8> {
        let mut sorted: Vec<&(Hash256, u64)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let mut fan_out = [0u32; 256];
        for (i, (hash, _)) in sorted.iter().enumerate() {
            let first = hash.as_bytes()[0] as usize;
            for slot in first..256 {
                fan_out[slot] = (i + 1) as u32;
            }
        }

        let mut buf = Vec::with_capacity(HEADER_LEN + FANOUT_LEN + sorted.len() * 40);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(sorted.len() as u64).to_le_bytes());
        for &count in &fan_out {
            buf.extend_from_slice(&count.to_le_bytes());
        }
        for (hash, _) in &sorted {
            buf.extend_from_slice(hash.as_bytes());
        }
        for (_, index) in &sorted {
            buf.extend_from_slice(&index.to_le_bytes());
        }
        buf
    }

    fn fanout(&self, slot: usize) -> usize {
        read_u32(self.data.bytes(), HEADER_LEN + slot * 4) as usize
    }

    fn hash_at(&self, i: usize) -> &[u8] {
        let off = HEADER_LEN + FANOUT_LEN + i * 32;
        &self.data.bytes()[off..off + 32]
    }

    fn index_at(&self, i: usize) -> u64 {
        let off = HEADER_LEN + FANOUT_LEN + self.count * 32 + i * 8;
        read_u64(self.data.bytes(), off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_hash(first: u8, rest: u8) -> Hash256 {
        let mut bytes = [rest; 32];
        bytes[0] = first;
        Hash256::new(bytes)
    }

    #[test]
    fn empty_table() {
        let idx = HashIndex::from_bytes(HashIndex::build(&[])).unwrap();
        assert!(idx.is_empty());
        assert_eq!(idx.lookup(&Hash256::null()), None);
    }

    #[test]
    fn build_and_lookup_single() {
        let hash = make_hash(0x42, 7);
        let idx = HashIndex::from_bytes(HashIndex::build(&[(hash, 99)])).unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.lookup(&hash), Some(99));
    }

    #[test]
    fn lookup_missing_returns_none() {
        let idx =
            HashIndex::from_bytes(HashIndex::build(&[(make_hash(1, 1), 0)])).unwrap();
        assert_eq!(idx.lookup(&make_hash(1, 2)), None);
        assert!(!idx.contains(&make_hash(2, 1)));
    }

    #[test]
    fn lookup_many_unsorted_input() {
        let entries: Vec<(Hash256, u64)> = (0..200u64)
            .rev()
            .map(|i| (make_hash((i % 256) as u8, (i / 7) as u8), i))
            .collect();
        let idx = HashIndex::from_bytes(HashIndex::build(&entries)).unwrap();
        assert_eq!(idx.len(), 200);
        for (hash, index) in &entries {
            assert_eq!(idx.lookup(hash), Some(*index), "entry {index}");
        }
    }

    #[test]
    fn fanout_boundary_buckets() {
        let low = make_hash(0x00, 3);
        let high = make_hash(0xFF, 3);
        let idx = HashIndex::from_bytes(HashIndex::build(&[(low, 1), (high, 2)])).unwrap();
        assert_eq!(idx.lookup(&low), Some(1));
        assert_eq!(idx.lookup(&high), Some(2));
    }

    #[test]
    fn from_bytes_bad_magic() {
        let mut bytes = HashIndex::build(&[]);
        bytes[0..4].copy_from_slice(b"BADM");
        let err = HashIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::InvalidMagic { .. }));
    }

    #[test]
    fn from_bytes_bad_version() {
        let mut bytes = HashIndex::build(&[]);
        bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
        let err = HashIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::UnsupportedVersion(9)));
    }

    #[test]
    fn from_bytes_truncated() {
        let err = HashIndex::from_bytes(b"CSHI".to_vec()).unwrap_err();
        assert!(matches!(err, IndexError::Corrupted(_)));
    }

    #[test]
    fn from_bytes_length_mismatch() {
        let mut bytes = HashIndex::build(&[(make_hash(5, 5), 0)]);
        bytes.push(0);
        let err = HashIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::Corrupted(_)));
    }

    #[test]
    fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx_hash.idx");
        let entries = vec![(make_hash(9, 1), 4u64), (make_hash(200, 2), 5u64)];
        std::fs::write(&path, HashIndex::build(&entries)).unwrap();

        let idx = HashIndex::open(&path).unwrap();
        assert_eq!(idx.lookup(&entries[0].0), Some(4));
        assert_eq!(idx.lookup(&entries[1].0), Some(5));
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashIndex::open(&dir.path().join("absent.idx")).unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }
}
