//! Common binary container for record files.
//!
//! Every `.dat` file starts with a 24-byte header: 4-byte magic, format
//! version (u32), record count (u64), record width (u32, 0 for
//! variable-width files), and a CRC32 of the payload region. Fixed-width
//! files follow the header with `count * width` bytes; variable-width
//! files follow it with a `(count + 1)`-entry u64 offset table (relative
//! to the heap) and then the heap itself. All integers little-endian.
//!
//! Opening validates magic, version, and exact byte length, O(1) in the
//! data size so opening a multi-gigabyte store stays cheap. CRC
//! verification is the separate, explicitly-invoked [`verify`] pass.
//!
//! [`verify`]: crate::store::ChainStore::verify

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{StoreError, StoreResult};

pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 24;

pub const BLOCKS_MAGIC: &[u8; 4] = b"CSBK";
pub const TXES_MAGIC: &[u8; 4] = b"CSTX";
pub const INPUTS_MAGIC: &[u8; 4] = b"CSIN";
pub const OUTPUTS_MAGIC: &[u8; 4] = b"CSOU";
pub const SCRIPTS_MAGIC: &[u8; 4] = b"CSSC";

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

/// Parsed file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub count: u64,
    pub width: u32,
    pub crc32: u32,
}

impl FileHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..16].copy_from_slice(&self.count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.width.to_le_bytes());
        buf[20..24].copy_from_slice(&self.crc32.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8], path: &Path) -> StoreResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: "file shorter than header".into(),
            });
        }
        Ok(Self {
            magic: bytes[0..4].try_into().unwrap(),
            version: read_u32(bytes, 4),
            count: read_u64(bytes, 8),
            width: read_u32(bytes, 16),
            crc32: read_u32(bytes, 20),
        })
    }
}

/// Assemble a complete file: header (with payload CRC) + payload.
pub fn file_bytes(magic: &[u8; 4], width: u32, count: u64, payload: &[u8]) -> Vec<u8> {
    let header = FileHeader {
        magic: *magic,
        version: FORMAT_VERSION,
        count,
        width,
        crc32: crc32fast::hash(payload),
    };
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}

/// A read-only mapped store file with a validated header.
#[derive(Debug)]
struct DataFile {
    map: Mmap,
    header: FileHeader,
    path: PathBuf,
}

impl DataFile {
    fn open(path: &Path, magic: &[u8; 4]) -> StoreResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::Missing(path.to_path_buf()),
            _ => StoreError::Io(e),
        })?;
        // The dataset contract makes this sound: store files are written
        // once by the offline parser and never modified afterwards.
        let map = unsafe { Mmap::map(&file)? };
        let header = FileHeader::decode(&map, path)?;
        if &header.magic != magic {
            return Err(StoreError::InvalidMagic {
                path: path.to_path_buf(),
                expected: String::from_utf8_lossy(magic).into(),
                actual: String::from_utf8_lossy(&header.magic).into(),
            });
        }
        if header.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: header.version,
            });
        }
        Ok(Self {
            map,
            header,
            path: path.to_path_buf(),
        })
    }

    fn payload(&self) -> &[u8] {
        &self.map[HEADER_LEN..]
    }

    fn verify_crc(&self) -> StoreResult<()> {
        let actual = crc32fast::hash(self.payload());
        if actual != self.header.crc32 {
            return Err(StoreError::CorruptFile {
                path: self.path.clone(),
                reason: format!(
                    "payload CRC mismatch: expected {:08x}, computed {actual:08x}",
                    self.header.crc32
                ),
            });
        }
        Ok(())
    }
}

/// Fixed-width record file.
#[derive(Debug)]
pub struct RecordFile {
    inner: DataFile,
}

impl RecordFile {
    pub fn open(path: &Path, magic: &[u8; 4], expected_width: u32) -> StoreResult<Self> {
        let inner = DataFile::open(path, magic)?;
        let header = inner.header;
        if header.width != expected_width {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: format!(
                    "unexpected record width: expected {expected_width}, got {}",
                    header.width
                ),
            });
        }
        let expected_len = header
            .count
            .checked_mul(header.width as u64)
            .map(|n| n + HEADER_LEN as u64)
            .ok_or_else(|| StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: "record count overflows".into(),
            })?;
        if inner.map.len() as u64 != expected_len {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: format!(
                    "length mismatch: expected {expected_len}, got {}",
                    inner.map.len()
                ),
            });
        }
        Ok(Self { inner })
    }

    pub fn count(&self) -> u64 {
        self.inner.header.count
    }

    pub fn width(&self) -> u32 {
        self.inner.header.width
    }

    /// Raw bytes of record `i`. Callers bound-check against [`count`](Self::count).
    pub fn record(&self, i: u64) -> &[u8] {
        debug_assert!(i < self.count());
        let width = self.inner.header.width as usize;
        let start = HEADER_LEN + i as usize * width;
        &self.inner.map[start..start + width]
    }

    pub fn verify_crc(&self) -> StoreResult<()> {
        self.inner.verify_crc()
    }
}

/// Variable-width record file: offset table + heap.
#[derive(Debug)]
pub struct VarFile {
    inner: DataFile,
    heap_start: usize,
}

impl VarFile {
    pub fn open(path: &Path, magic: &[u8; 4]) -> StoreResult<Self> {
        let inner = DataFile::open(path, magic)?;
        let header = inner.header;
        if header.width != 0 {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: format!("expected variable-width file, got width {}", header.width),
            });
        }
        let table_len = header
            .count
            .checked_add(1)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: "record count overflows".into(),
            })?;
        let min_len = HEADER_LEN as u64 + table_len;
        if (inner.map.len() as u64) < min_len {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: "offset table truncated".into(),
            });
        }

        // Offsets must be monotonic and span exactly the heap; record
        // access after this point slices without further checks.
        let heap_start = min_len as usize;
        let heap_len = (inner.map.len() - heap_start) as u64;
        let mut prev = 0u64;
        for i in 0..=header.count {
            let off = read_u64(&inner.map, HEADER_LEN + (i * 8) as usize);
            if off < prev {
                return Err(StoreError::CorruptFile {
                    path: path.to_path_buf(),
                    reason: "offset table not monotonic".into(),
                });
            }
            prev = off;
        }
        if read_u64(&inner.map, HEADER_LEN) != 0 || prev != heap_len {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: "offset table does not span heap".into(),
            });
        }

        Ok(Self { inner, heap_start })
    }

    pub fn count(&self) -> u64 {
        self.inner.header.count
    }

    /// Raw bytes of record `i`. Callers bound-check against [`count`](Self::count).
    pub fn record(&self, i: u64) -> &[u8] {
        debug_assert!(i < self.count());
        let start = read_u64(&self.inner.map, HEADER_LEN + (i * 8) as usize) as usize;
        let end = read_u64(&self.inner.map, HEADER_LEN + ((i + 1) * 8) as usize) as usize;
        &self.inner.map[self.heap_start + start..self.heap_start + end]
    }

    pub fn verify_crc(&self) -> StoreResult<()> {
        self.inner.verify_crc()
    }
}

/// Serialize a variable-width payload (offset table + heap) from records.
pub fn var_payload<'a>(records: impl Iterator<Item = &'a [u8]> + Clone) -> Vec<u8> {
    let mut payload = Vec::new();
    let mut offset = 0u64;
    payload.extend_from_slice(&offset.to_le_bytes());
    for record in records.clone() {
        offset += record.len() as u64;
        payload.extend_from_slice(&offset.to_le_bytes());
    }
    for record in records {
        payload.extend_from_slice(record);
    }
    payload
}
