//! Figure state: the layers and decorations of the plot being built.

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::color::{Color, FILL_ALPHA};
use crate::config::VizConfig;
use crate::font::FontHandle;
use crate::hist::{Binning, FillSummary, Histogram1D, Histogram2D};
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, LegendLocation};
use crate::layout::margins::{PlotArea, title_text_style};
use crate::plots::axes_draw::draw_axes;
use crate::plots::{hist1d, hist2d};
use crate::primitives::*;
use crate::{RenderError, Result};

/// Target number of major ticks per axis.
const TARGET_TICKS: usize = 6;

/// Display style of one histogram layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HistStyle {
    pub color: Color,
    /// Legend label; unlabeled layers are left out of the legend.
    pub label: Option<String>,
}

impl HistStyle {
    pub fn new(color: Color, label: impl Into<String>) -> Self {
        Self { color, label: Some(label.into()) }
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Hist1D { hist: Histogram1D, style: HistStyle },
    Hist2D { hist: Histogram2D },
}

/// Plot under construction. Drawing calls accumulate; [`Figure::clear`]
/// resets everything.
#[derive(Debug, Clone, Default)]
pub struct Figure {
    layers: Vec<Layer>,
    title: String,
    xlabel: String,
    ylabel: String,
    legend: Option<LegendLocation>,
    log: bool,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step-filled histogram of `series` over `[range.0, range.1)`.
    pub fn hist(&mut self, series: &[f64], range: (f64, f64), bins: usize, style: HistStyle) -> Result<FillSummary> {
        let binning = Binning::new(range.0, range.1, bins)?;
        let hist = Histogram1D::fill(series, binning);
        let summary = hist.summary();
        if summary.excluded() > 0 {
            log::debug!("{} of {} values outside [{}, {})", summary.excluded(), series.len(), range.0, range.1);
        }
        self.layers.push(Layer::Hist1D { hist, style });
        Ok(summary)
    }

    /// Add a 2-D density histogram of parallel `xs`, `ys`.
    pub fn hist2d(&mut self, xs: &[f64], ys: &[f64], x: (f64, f64, usize), y: (f64, f64, usize)) -> Result<()> {
        let x = Binning::new(x.0, x.1, x.2)?;
        let y = Binning::new(y.0, y.1, y.2)?;
        let hist = Histogram2D::fill(xs, ys, x, y)?;
        self.layers.push(Layer::Hist2D { hist });
        Ok(())
    }

    pub fn title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn xlabel(&mut self, label: impl Into<String>) {
        self.xlabel = label.into();
    }

    pub fn ylabel(&mut self, label: impl Into<String>) {
        self.ylabel = label.into();
    }

    pub fn legend(&mut self, location: LegendLocation) {
        self.legend = Some(location);
    }

    /// Logarithmic y axis (1-D) or color scale (2-D).
    pub fn set_log(&mut self, log: bool) {
        self.log = log;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// No layers and no decorations.
    pub fn is_blank(&self) -> bool {
        self.layers.is_empty()
            && self.title.is_empty()
            && self.xlabel.is_empty()
            && self.ylabel.is_empty()
            && self.legend.is_none()
            && !self.log
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn title_text(&self) -> &str {
        &self.title
    }

    pub fn legend_location(&self) -> Option<LegendLocation> {
        self.legend
    }

    pub fn is_log(&self) -> bool {
        self.log
    }

    /// Lay out and draw the figure as an SVG document.
    pub fn render_svg(&self, config: &VizConfig, fonts: Arc<FontHandle>) -> Result<String> {
        let mut canvas = Canvas::new(config.figure.width, config.figure.height, fonts);

        let hists: Vec<(&Histogram1D, &HistStyle)> = self
            .layers
            .iter()
            .filter_map(|l| match l {
                Layer::Hist1D { hist, style } => Some((hist, style)),
                Layer::Hist2D { .. } => None,
            })
            .collect();
        let density = self.layers.iter().find_map(|l| match l {
            Layer::Hist2D { hist } => Some(hist),
            Layer::Hist1D { .. } => None,
        });

        match density {
            Some(_) if !hists.is_empty() => {
                return Err(RenderError::Layout(
                    "1-D and 2-D histograms cannot share one figure".into(),
                ));
            }
            Some(h2) => self.draw_density(&mut canvas, h2, config),
            None => self.draw_hists(&mut canvas, &hists, config),
        }

        Ok(canvas.finish_svg())
    }

    fn draw_hists(&self, canvas: &mut Canvas, hists: &[(&Histogram1D, &HistStyle)], config: &VizConfig) {
        let (x_min, x_max) = hists
            .first()
            .map(|(h, _)| (h.binning.low, h.binning.high))
            .unwrap_or((0.0, 1.0));
        let x_axis = Axis::ranged(x_min, x_max, TARGET_TICKS).with_label(&self.xlabel);

        let max_count = hists.iter().map(|(h, _)| h.max_count()).fold(0.0_f64, f64::max);
        let y_axis = if self.log {
            let min_pos = hists
                .iter()
                .filter_map(|(h, _)| h.min_positive())
                .reduce(f64::min)
                .unwrap_or(1.0);
            Axis::auto_log(min_pos, max_count.max(min_pos))
        } else {
            Axis::counts(max_count, TARGET_TICKS)
        };
        let y_axis = y_axis.with_label(&self.ylabel);

        let area = PlotArea::tight(canvas, &x_axis, &y_axis, Some(self.title.as_str()), 0.0, config);

        canvas.push_clip(area.left, area.top, area.width, area.height);
        for (hist, style) in hists {
            hist1d::draw_hist1d(canvas, &area, &x_axis, &y_axis, hist, style.color);
        }
        canvas.pop_clip();

        draw_axes(canvas, &area, &x_axis, &y_axis, config);
        self.draw_title(canvas, &area, config);

        if let Some(location) = self.legend {
            let entries: Vec<LegendEntry> = hists
                .iter()
                .filter_map(|(_, style)| {
                    style.label.as_ref().map(|label| LegendEntry {
                        label: label.clone(),
                        fill: style.color.with_alpha(FILL_ALPHA),
                        edge: style.color,
                    })
                })
                .collect();
            let style = TextStyle { size: config.font.legend_size, weight: config.font.weight, ..Default::default() };
            legend::draw_legend(canvas, &area, &entries, location, &style);
        }
    }

    fn draw_density(&self, canvas: &mut Canvas, hist: &Histogram2D, config: &VizConfig) {
        let x_axis = Axis::ranged(hist.x.low, hist.x.high, TARGET_TICKS).with_label(&self.xlabel);
        let y_axis = Axis::ranged(hist.y.low, hist.y.high, TARGET_TICKS).with_label(&self.ylabel);
        let norm = hist2d::Norm::for_hist(hist, self.log);
        let reserve = hist2d::colorbar_reserve(canvas, &norm.axis(), config);

        let area = PlotArea::tight(canvas, &x_axis, &y_axis, Some(self.title.as_str()), reserve, config);

        canvas.push_clip(area.left, area.top, area.width, area.height);
        hist2d::draw_hist2d(canvas, &area, &x_axis, &y_axis, hist, norm);
        canvas.pop_clip();

        draw_axes(canvas, &area, &x_axis, &y_axis, config);
        hist2d::draw_colorbar(canvas, &area, norm, config);
        self.draw_title(canvas, &area, config);
    }

    fn draw_title(&self, canvas: &mut Canvas, area: &PlotArea, config: &VizConfig) {
        if self.title.is_empty() {
            return;
        }
        let style = TextStyle { anchor: TextAnchor::Middle, ..title_text_style(config) };
        canvas.text(area.left + area.width / 2.0, area.top - 6.0, &self.title, &style);
    }
}
