use std::path::Path;

use chainscope_types::{Address, AddressType};

use crate::error::{IndexError, IndexResult};
use crate::table::{map_file, read_u32, read_u64, TableData};

const MAGIC: &[u8; 4] = b"CSAI";
const VERSION: u32 = 1;

/// Header: magic + version + count + heap length.
const HEADER_LEN: usize = 24;
/// Entry: dense index (u32) + type code (u8) + 3 bytes padding.
const ENTRY_LEN: usize = 8;

/// Maps canonical address strings to their `(index, type)` identity.
///
/// Keys are stored sorted lexicographically by byte in a string heap
/// addressed through a `(count + 1)`-entry offset table; exact lookups are
/// a binary search and prefix lookups are a lower-bound search followed by
/// a forward walk.
///
/// Ordering guarantee: [`lookup_prefix`](Self::lookup_prefix) returns
/// matches in lexicographic order of their canonical string form, not in
/// dense-index order. Callers may rely on this.
#[derive(Debug)]
pub struct AddressIndex {
    data: TableData,
    count: usize,
    heap_len: usize,
}

impl AddressIndex {
    /// Map an index file read-only.
    pub fn open(path: &Path) -> IndexResult<Self> {
        Self::validate(map_file(path)?)
    }

    /// Open from an in-memory table (as produced by [`AddressIndex::build`]).
    pub fn from_bytes(bytes: Vec<u8>) -> IndexResult<Self> {
        Self::validate(TableData::Owned(bytes))
    }

    fn validate(data: TableData) -> IndexResult<Self> {
        let bytes = data.bytes();
        if bytes.len() < HEADER_LEN {
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
        let heap_len = read_u64(bytes, 16) as usize;

        let expected_len = HEADER_LEN + (count + 1) * 8 + count * ENTRY_LEN + heap_len;
        if bytes.len() != expected_len {
            return Err(IndexError::Corrupted(format!(
                "length mismatch: expected {expected_len}, got {}",
                bytes.len()
            )));
        }

        // Offsets must be monotonic and span exactly the heap; every key
        // access after this point slices without further checks.
        let mut prev = 0u64;
        for i in 0..=count {
            let off = read_u64(bytes, HEADER_LEN + i * 8);
            if off < prev {
                return Err(IndexError::Corrupted("offset table not monotonic".into()));
            }
            prev = off;
        }
        if prev as usize != heap_len {
            return Err(IndexError::Corrupted("offset table does not span heap".into()));
        }
        if read_u64(bytes, HEADER_LEN) != 0 {
            return Err(IndexError::Corrupted("offset table must start at 0".into()));
        }

        Ok(Self {
            data,
            count,
            heap_len,
        })
    }

    /// Number of addresses in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Exact lookup of a canonical address string.
    pub fn lookup(&self, key: &str) -> Option<Address> {
        let needle = key.as_bytes();
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_at(mid).cmp(needle) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return self.entry_at(mid),
            }
        }
        None
    }

    /// All addresses whose canonical string starts with `prefix`, in
    /// lexicographic key order.
    pub fn lookup_prefix(&self, prefix: &str) -> Vec<Address> {
        let needle = prefix.as_bytes();
        let mut out = Vec::new();
        for i in self.lower_bound(needle)..self.count {
            if !self.key_at(i).starts_with(needle) {
                break;
            }
            if let Some(address) = self.entry_at(i) {
                out.push(address);
            }
        }
        out
    }

    /// The canonical string at position `i` (table order), for inspection.
    pub fn key(&self, i: usize) -> Option<&str> {
        if i >= self.count {
            return None;
        }
        std::str::from_utf8(self.key_at(i)).ok()
    }

    /// Serialize a table from (canonical string, address) entries.
    pub fn build(entries: &[(String, Address)]) -> Vec<u8> {
        let mut sorted: Vec<&(String, Address)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let heap_len: usize = sorted.iter().map(|(key, _)| key.len()).sum();

        let mut buf =
            Vec::with_capacity(HEADER_LEN + (sorted.len() + 1) * 8 + sorted.len() * ENTRY_LEN + heap_len);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(sorted.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(heap_len as u64).to_le_bytes());

        let mut offset = 0u64;
        buf.extend_from_slice(&offset.to_le_bytes());
        for (key, _) in &sorted {
            offset += key.len() as u64;
            buf.extend_from_slice(&offset.to_le_bytes());
        }
        for (_, address) in &sorted {
            buf.extend_from_slice(&address.index.to_le_bytes());
            buf.push(address.ty.code());
            buf.extend_from_slice(&[0u8; 3]);
        }
        for (key, _) in &sorted {
            buf.extend_from_slice(key.as_bytes());
        }
        buf
    }

    /// First position whose key is >= `needle`.
    fn lower_bound(&self, needle: &[u8]) -> usize {
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid) < needle {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn key_at(&self, i: usize) -> &[u8] {
        let bytes = self.data.bytes();
        let start = read_u64(bytes, HEADER_LEN + i * 8) as usize;
        let end = read_u64(bytes, HEADER_LEN + (i + 1) * 8) as usize;
        let heap = HEADER_LEN + (self.count + 1) * 8 + self.count * ENTRY_LEN;
        &bytes[heap + start..heap + end]
    }

    fn entry_at(&self, i: usize) -> Option<Address> {
        let bytes = self.data.bytes();
        let off = HEADER_LEN + (self.count + 1) * 8 + i * ENTRY_LEN;
        let index = read_u32(bytes, off);
        let ty = AddressType::from_code(bytes[off + 4])?;
        Some(Address::new(index, ty))
    }

    // heap_len is folded into the validated length; kept for Debug asserts.
    #[allow(dead_code)]
    fn heap_len(&self) -> usize {
        self.heap_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, index: u32, ty: AddressType) -> (String, Address) {
        (key.to_string(), Address::new(index, ty))
    }

    fn sample_entries() -> Vec<(String, Address)> {
        vec![
            entry("pkh:aa11", 2, AddressType::PubkeyHash),
            entry("pkh:aa22", 0, AddressType::PubkeyHash),
            entry("sh:bb", 1, AddressType::ScriptHash),
            entry("wpkh:cc", 0, AddressType::WitnessPubkeyHash),
        ]
    }

    #[test]
    fn empty_table() {
        let idx = AddressIndex::from_bytes(AddressIndex::build(&[])).unwrap();
        assert!(idx.is_empty());
        assert_eq!(idx.lookup("pkh:aa"), None);
        assert!(idx.lookup_prefix("").is_empty());
    }

    #[test]
    fn exact_lookup() {
        let idx = AddressIndex::from_bytes(AddressIndex::build(&sample_entries())).unwrap();
        assert_eq!(
            idx.lookup("pkh:aa22"),
            Some(Address::new(0, AddressType::PubkeyHash))
        );
        assert_eq!(
            idx.lookup("sh:bb"),
            Some(Address::new(1, AddressType::ScriptHash))
        );
        assert_eq!(idx.lookup("pkh:aa33"), None);
        assert_eq!(idx.lookup("pkh:aa"), None);
    }

    #[test]
    fn prefix_lookup_is_lexicographic() {
        let idx = AddressIndex::from_bytes(AddressIndex::build(&sample_entries())).unwrap();
        let matches = idx.lookup_prefix("pkh:");
        // Lexicographic by key, NOT by dense index (2 before 0 here).
        assert_eq!(
            matches,
            vec![
                Address::new(2, AddressType::PubkeyHash),
                Address::new(0, AddressType::PubkeyHash),
            ]
        );
    }

    #[test]
    fn prefix_lookup_no_matches() {
        let idx = AddressIndex::from_bytes(AddressIndex::build(&sample_entries())).unwrap();
        assert!(idx.lookup_prefix("zz").is_empty());
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let entries = sample_entries();
        let idx = AddressIndex::from_bytes(AddressIndex::build(&entries)).unwrap();
        assert_eq!(idx.lookup_prefix("").len(), entries.len());
    }

    #[test]
    fn keys_are_stored_sorted() {
        let idx = AddressIndex::from_bytes(AddressIndex::build(&sample_entries())).unwrap();
        let keys: Vec<&str> = (0..idx.len()).map(|i| idx.key(i).unwrap()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn from_bytes_bad_magic() {
        let mut bytes = AddressIndex::build(&[]);
        bytes[0..4].copy_from_slice(b"BADM");
        let err = AddressIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::InvalidMagic { .. }));
    }

    #[test]
    fn from_bytes_bad_version() {
        let mut bytes = AddressIndex::build(&[]);
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        let err = AddressIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::UnsupportedVersion(7)));
    }

    #[test]
    fn from_bytes_length_mismatch() {
        let mut bytes = AddressIndex::build(&sample_entries());
        bytes.truncate(bytes.len() - 1);
        let err = AddressIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::Corrupted(_)));
    }

    #[test]
    fn from_bytes_non_monotonic_offsets() {
        let entries = sample_entries();
        let mut bytes = AddressIndex::build(&entries);
        // Swap the second offset entry with a larger later one.
        let off = HEADER_LEN + 8;
        bytes[off..off + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = AddressIndex::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, IndexError::Corrupted(_)));
    }

    #[test]
    fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.idx");
        std::fs::write(&path, AddressIndex::build(&sample_entries())).unwrap();

        let idx = AddressIndex::open(&path).unwrap();
        assert_eq!(idx.len(), 4);
        assert_eq!(
            idx.lookup("wpkh:cc"),
            Some(Address::new(0, AddressType::WitnessPubkeyHash))
        );
    }
}
