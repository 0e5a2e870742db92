//! [`TableReader`] backed by ROOT trees.

use std::path::Path;

use nb_core::{Error, Table, TableReader};

use crate::file::RootFile;

/// Reads per-event tables from ROOT `TTree`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootTableReader;

impl TableReader for RootTableReader {
    fn open_table(&self, path: &Path, table: &str, columns: &[&str]) -> nb_core::Result<Table> {
        let wrap = |e: crate::RootError| Error::TableRead {
            path: path.to_path_buf(),
            table: table.to_string(),
            source: Box::new(e),
        };

        let file = RootFile::open(path).map_err(wrap)?;
        let tree = file.get_tree(table).map_err(wrap)?;
        let n_entries = tree.entries as usize;

        let mut out = Table::new(n_entries);
        for &name in columns {
            let column = file.branch_column(&tree, name).map_err(wrap)?;
            if column.n_entries() != n_entries {
                return Err(Error::FieldShape {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                    reason: format!(
                        "{} column has {} entries, table has {n_entries}",
                        column.shape_name(),
                        column.n_entries()
                    ),
                });
            }
            out.insert(name, column);
        }
        log::debug!("read {} columns x {n_entries} entries from {}", columns.len(), path.display());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_is_table_read_error() {
        let err = RootTableReader
            .open_table(Path::new("/nonexistent/anahist_3.root"), "nnbar/nnbar", &["NumberTracks"])
            .unwrap_err();
        match err {
            Error::TableRead { path, table, .. } => {
                assert_eq!(path, Path::new("/nonexistent/anahist_3.root"));
                assert_eq!(table, "nnbar/nnbar");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
