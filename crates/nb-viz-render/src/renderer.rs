//! The five rendering operations.
//!
//! Each operation builds the figure, writes `<out_dir>/<name>.png` through the
//! sink and clears the figure, also when building or saving fails.

use std::path::PathBuf;
use std::sync::Arc;

use nb_core::ImageSink;

use crate::color::Role;
use crate::config::VizConfig;
use crate::figure::{Figure, HistStyle};
use crate::font::FontHandle;
use crate::layout::legend::LegendLocation;
use crate::output::png::svg_to_png;
use crate::Result;

/// One flat series and the role that picks its color and legend label.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub role: Role,
    pub values: &'a [f64],
}

impl<'a> Series<'a> {
    pub fn new(role: Role, values: &'a [f64]) -> Self {
        Self { role, values }
    }
}

/// Display metadata of a 1-D histogram plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotMeta<'a> {
    pub title: &'a str,
    pub xlabel: &'a str,
    pub ylabel: &'a str,
    /// Half-open `[low, high)`.
    pub range: (f64, f64),
    pub bins: usize,
    pub legend: LegendLocation,
    pub log: bool,
}

/// Display metadata of a 2-D histogram plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hist2dMeta<'a> {
    pub title: &'a str,
    pub xlabel: &'a str,
    pub ylabel: &'a str,
    pub x_range: (f64, f64),
    pub x_bins: usize,
    pub y_range: (f64, f64),
    pub y_bins: usize,
    pub log: bool,
}

/// Renders figures to PNG files under one output directory.
pub struct PlotRenderer<S: ImageSink> {
    config: VizConfig,
    out_dir: PathBuf,
    figure: Figure,
    sink: S,
    fonts: Arc<FontHandle>,
}

impl<S: ImageSink> PlotRenderer<S> {
    pub fn new(config: VizConfig, out_dir: impl Into<PathBuf>, sink: S, fonts: Arc<FontHandle>) -> Self {
        Self { config, out_dir: out_dir.into(), figure: Figure::new(), sink, fonts }
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Figure for callers that issue their own draw calls before [`draw_plot`](Self::draw_plot).
    pub fn figure_mut(&mut self) -> &mut Figure {
        &mut self.figure
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// One series, colored and labeled by its role.
    pub fn render_single(&mut self, name: &str, series: Series<'_>, meta: &PlotMeta<'_>) -> Result<PathBuf> {
        self.render_overlay(name, &[series], meta)
    }

    /// Two overlaid series sharing one legend.
    pub fn render_pair(
        &mut self,
        name: &str,
        first: Series<'_>,
        second: Series<'_>,
        meta: &PlotMeta<'_>,
    ) -> Result<PathBuf> {
        self.render_overlay(name, &[first, second], meta)
    }

    /// Truth, MC-reco and reconstructed series overlaid.
    pub fn render_triple(&mut self, name: &str, series: [Series<'_>; 3], meta: &PlotMeta<'_>) -> Result<PathBuf> {
        self.render_overlay(name, &series, meta)
    }

    /// Save whatever has been drawn on the figure.
    pub fn draw_plot(&mut self, name: &str) -> Result<PathBuf> {
        self.finish(name, Ok(()))
    }

    /// Density image of `ys` against `xs` with a colorbar.
    pub fn render_hist2d(&mut self, name: &str, xs: &[f64], ys: &[f64], meta: &Hist2dMeta<'_>) -> Result<PathBuf> {
        let figure = &mut self.figure;
        let drawn = figure
            .hist2d(xs, ys, (meta.x_range.0, meta.x_range.1, meta.x_bins), (meta.y_range.0, meta.y_range.1, meta.y_bins))
            .map(|()| {
                figure.title(meta.title);
                figure.xlabel(meta.xlabel);
                figure.ylabel(meta.ylabel);
                figure.set_log(meta.log);
            });
        self.finish(name, drawn)
    }

    fn render_overlay(&mut self, name: &str, series: &[Series<'_>], meta: &PlotMeta<'_>) -> Result<PathBuf> {
        let drawn = self.draw_overlay(series, meta);
        self.finish(name, drawn)
    }

    fn draw_overlay(&mut self, series: &[Series<'_>], meta: &PlotMeta<'_>) -> Result<()> {
        let figure = &mut self.figure;
        for s in series {
            let style = HistStyle::new(s.role.color(), s.role.label());
            figure.hist(s.values, meta.range, meta.bins, style)?;
        }
        figure.title(meta.title);
        figure.xlabel(meta.xlabel);
        figure.ylabel(meta.ylabel);
        figure.legend(meta.legend);
        figure.set_log(meta.log);
        Ok(())
    }

    /// Save if drawing succeeded, then clear the figure either way.
    fn finish(&mut self, name: &str, drawn: Result<()>) -> Result<PathBuf> {
        let result = drawn.and_then(|()| self.save(name));
        self.figure.clear();
        result
    }

    fn save(&mut self, name: &str) -> Result<PathBuf> {
        let svg = self.figure.render_svg(&self.config, Arc::clone(&self.fonts))?;
        let png = svg_to_png(&svg, &self.fonts, self.config.pixel_scale())?;
        let path = self.out_dir.join(format!("{name}.png"));
        self.sink.save_image(&png, &path)?;
        log::debug!("wrote {} ({} bytes)", path.display(), png.len());
        Ok(path)
    }
}
