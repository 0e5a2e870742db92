//! TFile header parsing and the top-level file interface.

use std::path::{Path, PathBuf};

use nb_core::{Column, JaggedColumn};

use crate::branch_reader::BranchReader;
use crate::datasource::DataSource;
use crate::directory::Directory;
use crate::error::{Result, RootError};
use crate::key::KeyInfo;
use crate::objects;
use crate::rbuffer::RBuffer;
use crate::tree::{BranchInfo, Tree};

const ROOT_MAGIC: &[u8; 4] = b"root";

/// Files shorter than the fixed header cannot be ROOT files.
const MIN_FILE_LEN: usize = 64;

/// A ROOT file opened for reading trees.
pub struct RootFile {
    data: DataSource,
    path: PathBuf,
    top: Directory,
}

impl RootFile {
    /// Open and parse a ROOT file from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = DataSource::map(&path)?;
        Self::from_datasource(data, path)
    }

    /// Parse a ROOT file held in memory.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::from(data), path)
    }

    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < MIN_FILE_LEN || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let record_at = top_directory_offset(&data)?;
        let record = data.get(record_at..).ok_or(RootError::BufferUnderflow {
            offset: record_at,
            need: 1,
            have: 0,
        })?;
        let top = Directory::read_record(record, &data)?;
        log::debug!("opened {} ({} top-level keys)", path.display(), top.keys().len());
        Ok(Self { data, path, top })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys of the top-level directory.
    pub fn list_keys(&self) -> Vec<KeyInfo> {
        self.top.keys().iter().map(KeyInfo::from).collect()
    }

    /// Load the tree at `path`, e.g. `"nnbar/nnbar"` for tree `nnbar` inside
    /// directory `nnbar`.
    pub fn get_tree(&self, path: &str) -> Result<Tree> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let Some((tree_name, dirs)) = parts.split_last() else {
            return Err(RootError::TreeNotFound(path.to_string()));
        };

        let mut dir = None;
        for name in dirs {
            let current = dir.as_ref().unwrap_or(&self.top);
            let key = current
                .find_key(name)
                .ok_or_else(|| RootError::KeyNotFound(format!("{name} (in '{path}')")))?;
            if !matches!(key.class_name.as_str(), "TDirectoryFile" | "TDirectory") {
                return Err(RootError::TreeNotFound(format!(
                    "'{name}' in '{path}' is a {}, not a directory",
                    key.class_name
                )));
            }
            let payload = key.payload(&self.data)?;
            dir = Some(Directory::read_record(&payload, &self.data)?);
        }

        let current = dir.as_ref().unwrap_or(&self.top);
        let key = current
            .find_key(tree_name)
            .ok_or_else(|| RootError::TreeNotFound(path.to_string()))?;
        if key.class_name != "TTree" {
            return Err(RootError::TreeNotFound(format!("'{path}' is a {}", key.class_name)));
        }
        let payload = key.payload(&self.data)?;
        objects::read_tree(&payload, key.key_len as usize)
    }

    /// Reader for the named branch of `tree`.
    pub fn branch_reader<'a>(&'a self, tree: &'a Tree, name: &str) -> Result<BranchReader<'a>> {
        Ok(BranchReader::new(&self.data, self.branch(tree, name)?))
    }

    /// Values of a fixed-size branch.
    pub fn branch_data(&self, tree: &Tree, name: &str) -> Result<Vec<f64>> {
        self.branch_reader(tree, name)?.as_f64()
    }

    /// Values of a branch, one row per entry.
    pub fn branch_data_jagged(&self, tree: &Tree, name: &str) -> Result<JaggedColumn> {
        self.branch_reader(tree, name)?.as_jagged()
    }

    /// A branch as a scalar or jagged table column.
    pub fn branch_column(&self, tree: &Tree, name: &str) -> Result<Column> {
        self.branch_reader(tree, name)?.read_column()
    }

    fn branch<'a>(&self, tree: &'a Tree, name: &str) -> Result<&'a BranchInfo> {
        tree.find_branch(name).ok_or_else(|| RootError::BranchNotFound(name.to_string()))
    }
}

/// Offset of the top `TDirectory` record (`fBEGIN + fNbytesName`).
///
/// Small-file header layout (`fVersion < 1000000`):
/// ```text
/// offset  size  field
///    0      4   magic "root"
///    4      4   fVersion
///    8      4   fBEGIN
///   12      4   fEND
///   16      4   fSeekFree
///   20      4   fNbytesFree
///   24      4   nfree
///   28      4   fNbytesName
/// ```
/// Large files widen `fEND` and `fSeekFree` to 8 bytes.
fn top_directory_offset(data: &[u8]) -> Result<usize> {
    let mut r = RBuffer::at(data, 4);
    let version = r.read_u32()?;
    let begin = r.read_u32()? as usize;
    if version >= 1_000_000 {
        r.skip(16)?; // fEND, fSeekFree
    } else {
        r.skip(8)?;
    }
    let _nbytes_free = r.read_u32()?;
    let _nfree = r.read_u32()?;
    let nbytes_name = r.read_u32()? as usize;
    Ok(begin + nbytes_name)
}
