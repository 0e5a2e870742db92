//! `TKey` records: the headers that locate every object in a ROOT file.

use std::borrow::Cow;

use crate::decompress::decompress;
use crate::error::{Result, RootError};
use crate::rbuffer::RBuffer;

/// A parsed `TKey` header.
#[derive(Debug, Clone)]
pub struct Key {
    /// Bytes on disk: key header plus (possibly compressed) object.
    pub n_bytes: u32,
    /// Key class version; above 1000 means 64-bit seek fields.
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header.
    pub key_len: u16,
    /// Cycle number within the directory.
    pub cycle: u16,
    /// Absolute file offset of this key.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Name, class and cycle of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class (`"TTree"`, `"TDirectoryFile"`, ...).
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl From<&Key> for KeyInfo {
    fn from(key: &Key) -> Self {
        Self { name: key.name.clone(), class_name: key.class_name.clone(), cycle: key.cycle }
    }
}

impl Key {
    /// Read a key header at the reader's position.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let seek_key = if version > 1000 {
            let seek_key = r.read_u64()?;
            let _seek_pdir = r.read_u64()?;
            seek_key
        } else {
            let seek_key = r.read_u32()? as u64;
            let _seek_pdir = r.read_u32()?;
            seek_key
        };

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key { n_bytes, version, obj_len, key_len, cycle, seek_key, class_name, name, title })
    }

    /// Whether the stored object bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != self.stored_len()
    }

    /// Object bytes on disk (excluding the key header).
    pub fn stored_len(&self) -> usize {
        (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }

    /// The object bytes, decompressed when needed.
    pub fn payload<'f>(&self, file: &'f [u8]) -> Result<Cow<'f, [u8]>> {
        let start = self.seek_key as usize + self.key_len as usize;
        let end = self.seek_key as usize + self.n_bytes as usize;
        let stored = file.get(start..end).ok_or(RootError::BufferUnderflow {
            offset: start,
            need: end.saturating_sub(start),
            have: file.len().saturating_sub(start),
        })?;
        if self.is_compressed() {
            Ok(Cow::Owned(decompress(stored, self.obj_len as usize)?))
        } else {
            Ok(Cow::Borrowed(stored))
        }
    }
}
