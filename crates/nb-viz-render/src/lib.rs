//! # nb-viz-render
//!
//! Histogram rendering for the nnbar plotting tool.
//!
//! A [`Figure`] collects histogram layers, a title, axis labels and a legend;
//! [`PlotRenderer`] lays it out on an SVG [`canvas::Canvas`], rasterizes it
//! to PNG through `resvg` and hands the bytes to an [`nb_core::ImageSink`].
//! Every renderer operation writes exactly one image and leaves the figure
//! blank.

pub mod canvas;
pub mod color;
pub mod config;
pub mod figure;
pub mod font;
pub mod hist;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod renderer;
pub mod sink;
pub mod text;

use thiserror::Error;

pub use color::{Color, Role};
pub use config::VizConfig;
pub use figure::{Figure, HistStyle};
pub use hist::{FillSummary, Histogram1D, Histogram2D};
pub use layout::legend::LegendLocation;
pub use renderer::{Hist2dMeta, PlotMeta, PlotRenderer, Series};
pub use sink::FileSink;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[error(transparent)]
    Core(nb_core::Error),
}

impl From<nb_core::Error> for RenderError {
    /// Sink I/O failures stay I/O errors; everything else is wrapped.
    fn from(e: nb_core::Error) -> Self {
        match e {
            nb_core::Error::Io(io) => RenderError::Io(io),
            other => RenderError::Core(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
