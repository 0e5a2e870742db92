//! Backing storage for an opened ROOT file.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::error::Result;

/// File bytes, either memory-mapped from disk or owned in memory.
pub enum DataSource {
    /// Bytes owned in a `Vec<u8>` (in-memory files, tests).
    Owned(Vec<u8>),
    /// Read-only memory map of a file on disk.
    Mmap(memmap2::Mmap),
}

impl DataSource {
    /// Map `path` read-only.
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and input files are not modified
        // while a run is reading them.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self::Mmap(mmap))
    }
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes)
    }
}
