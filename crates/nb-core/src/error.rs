//! Error types shared by the nnbar crates.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error from a table or image backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table backend failed to open or decode a table.
    #[error("failed to read table '{table}' from {}", path.display())]
    TableRead {
        /// File that was being read.
        path: PathBuf,
        /// Table path inside the file.
        table: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },

    /// A column exists but does not have the shape the caller asked for.
    #[error("column '{column}' in {}: {reason}", path.display())]
    FieldShape {
        /// File the column came from.
        path: PathBuf,
        /// Column name.
        column: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The image backend failed to store an encoded image.
    #[error("failed to save image {}", path.display())]
    ImageSave {
        /// Destination path.
        path: PathBuf,
        /// Backend error.
        #[source]
        source: BoxError,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
