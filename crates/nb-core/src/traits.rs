//! Seams between the aggregation logic and its I/O backends.

use std::path::Path;

use crate::Result;
use crate::types::Table;

/// Reads a named per-event table from a structured file.
pub trait TableReader {
    /// Open `path`, locate the table at `table` (a slash-separated path such
    /// as `"nnbar/nnbar"`) and read exactly the named `columns`.
    ///
    /// Every requested column must be present in the returned table.
    fn open_table(&self, path: &Path, table: &str, columns: &[&str]) -> Result<Table>;
}

/// Stores an encoded image.
pub trait ImageSink {
    /// Write `image` (encoded bytes) to `path`.
    fn save_image(&mut self, image: &[u8], path: &Path) -> Result<()>;
}

impl<T: TableReader + ?Sized> TableReader for &T {
    fn open_table(&self, path: &Path, table: &str, columns: &[&str]) -> Result<Table> {
        (**self).open_table(path, table, columns)
    }
}

impl<S: ImageSink + ?Sized> ImageSink for &mut S {
    fn save_image(&mut self, image: &[u8], path: &Path) -> Result<()> {
        (**self).save_image(image, path)
    }
}
