//! # nb-root
//!
//! Native reader for the ROOT ntuples written by the nnbar event analyzer.
//!
//! Opens `.root` files (memory-mapped), walks `TDirectoryFile` paths, parses
//! `TTree` branch metadata and decodes branch baskets into `f64` columns.
//! Scalar leaves (`NumberTracks/I`, `TrueEventEnergy/D`) decode to flat
//! vectors; `std::vector<T>` and `x[n]/T` branches decode to jagged columns.
//! Supports zlib, LZ4, ZSTD and XZ compressed payloads.
//!
//! ## Example
//!
//! ```no_run
//! use nb_root::RootFile;
//!
//! let f = RootFile::open("anahist_0.root").unwrap();
//! let tree = f.get_tree("nnbar/nnbar").unwrap();
//! let n_tracks: Vec<f64> = f.branch_data(&tree, "NumberTracks").unwrap();
//! let lengths = f.branch_data_jagged(&tree, "TrackLength").unwrap();
//! assert_eq!(n_tracks.len(), lengths.n_entries());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basket;
pub mod branch_reader;
pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod table;
pub mod tree;

pub use branch_reader::BranchReader;
pub use error::{Result, RootError};
pub use file::RootFile;
pub use key::KeyInfo;
pub use nb_core::JaggedColumn;
pub use table::RootTableReader;
pub use tree::{BranchInfo, BranchKind, LeafType, Tree};
