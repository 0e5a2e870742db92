//! Drawing routines for the plot area contents.

pub mod axes_draw;
pub mod hist1d;
pub mod hist2d;
