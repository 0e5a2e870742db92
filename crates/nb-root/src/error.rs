//! Error type for ROOT file reading.

use thiserror::Error;

/// Errors raised while reading ROOT files.
#[derive(Error, Debug)]
pub enum RootError {
    /// I/O error opening or mapping the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the `root` magic.
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    /// A read ran past the end of a buffer.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// A compressed block could not be decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// A streamed object did not have the expected layout.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// No key with that name in the directory.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The path does not name a `TTree`.
    #[error("tree not found: {0}")]
    TreeNotFound(String),

    /// The tree has no branch with that name.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// The branch cannot be decoded the way the caller asked.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RootError>;
