use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::IndexResult;

/// Backing bytes for an index table: a read-only mapping of the on-disk
/// file, or an owned buffer for tables built in memory.
#[derive(Debug)]
pub(crate) enum TableData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl TableData {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Owned(buf) => buf,
        }
    }
}

/// Map a table file read-only.
///
/// Safety of the mapping rests on the dataset contract: table files are
/// written once by the offline builder and never modified afterwards.
pub(crate) fn map_file(path: &Path) -> IndexResult<TableData> {
    let file = File::open(path)?;
    let map = unsafe { Mmap::map(&file)? };
    Ok(TableData::Mapped(map))
}

/// Read a little-endian u32 at `offset`. Caller guarantees bounds.
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Read a little-endian u64 at `offset`. Caller guarantees bounds.
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}
