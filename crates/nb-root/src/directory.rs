//! `TDirectory` records and their key lists.

use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Keys of one directory, in on-disk order.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list stored at `seek_keys`.
    ///
    /// The list is itself written as a key: a `TKey` header, a u32 key
    /// count, then that many `TKey` headers.
    pub fn read_key_list(file: &[u8], seek_keys: u64) -> Result<Self> {
        let start = usize::try_from(seek_keys)
            .map_err(|_| RootError::Deserialization(format!("seek_keys {seek_keys} out of range")))?;
        let mut r = RBuffer::at(file, start);
        let _list = Key::read(&mut r)?;
        let n_keys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(n_keys.min(r.remaining() / 26));
        for _ in 0..n_keys {
            keys.push(Key::read(&mut r)?);
        }
        Ok(Directory { keys })
    }

    /// Read a directory from its `TDirectory` streamer record.
    ///
    /// `record` starts at the streamer: for the top directory that is
    /// `fBEGIN + fNbytesName` in the file, for subdirectories the payload of
    /// their `TDirectoryFile` key.
    pub fn read_record(record: &[u8], file: &[u8]) -> Result<Self> {
        let mut r = RBuffer::new(record);
        let version = r.read_u16()?;
        let _ctime = r.read_u32()?;
        let _mtime = r.read_u32()?;
        let _nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;
        let seek_keys = if version > 1000 {
            let _seek_dir = r.read_u64()?;
            let _seek_parent = r.read_u64()?;
            r.read_u64()?
        } else {
            let _seek_dir = r.read_u32()?;
            let _seek_parent = r.read_u32()?;
            r.read_u32()? as u64
        };

        if seek_keys == 0 {
            return Ok(Directory::default());
        }
        Self::read_key_list(file, seek_keys)
    }

    /// All keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The key named `name` with the highest cycle.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }
}
