//! Streamers for the ROOT classes this crate understands.

pub mod ttree;

pub use ttree::read_tree;
