//! # nb-core
//!
//! Shared types and seams for the nnbar plotting tool.
//!
//! The aggregator reads per-event tables through [`TableReader`] and the
//! renderer writes encoded images through [`ImageSink`]; both are traits so
//! either side can be replaced in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{ImageSink, TableReader};
pub use types::{Column, JaggedColumn, Table};
