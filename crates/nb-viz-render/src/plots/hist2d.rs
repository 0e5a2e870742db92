use crate::canvas::Canvas;
use crate::color::{Color, viridis};
use crate::config::VizConfig;
use crate::hist::Histogram2D;
use crate::layout::axes::Axis;
use crate::layout::margins::{PlotArea, TICK_LABEL_GAP, tick_text_style};
use crate::plots::axes_draw::draw_frame;
use crate::primitives::*;

/// Gap between the plot area and the colorbar.
const BAR_GAP: f64 = 12.0;
const BAR_WIDTH: f64 = 14.0;
/// Gradient resolution of the colorbar.
const BAR_STEPS: usize = 64;

/// Color normalization of bin counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Norm {
    /// `[0, max]` mapped linearly.
    Linear { max: f64 },
    /// `[min positive, max]` mapped logarithmically.
    Log { min: f64, max: f64 },
}

impl Norm {
    pub fn for_hist(hist: &Histogram2D, log: bool) -> Self {
        let max = hist.max_count().max(1.0);
        if log {
            let min = hist.counts.iter().copied().filter(|&c| c > 0.0).fold(max, f64::min);
            Norm::Log { min, max }
        } else {
            Norm::Linear { max }
        }
    }

    /// Position of `count` on the colormap, or `None` when the bin is not drawn.
    pub fn scale(&self, count: f64) -> Option<f64> {
        match *self {
            Norm::Linear { max } => Some(count / max),
            Norm::Log { .. } if count <= 0.0 => None,
            Norm::Log { min, max } if max <= min => Some(1.0),
            Norm::Log { min, max } => Some((count.ln() - min.ln()) / (max.ln() - min.ln())),
        }
    }

    /// Axis for the colorbar.
    pub fn axis(&self) -> Axis {
        match *self {
            Norm::Linear { max } => Axis::ranged(0.0, max, 6),
            Norm::Log { min, max } => Axis::auto_log(min, max),
        }
    }
}

/// Draw the bins of a 2-D histogram as colored cells.
pub fn draw_hist2d(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    hist: &Histogram2D,
    norm: Norm,
) {
    for iy in 0..hist.y.bins {
        let py_lo = y_axis.data_to_pixel(hist.y_edges[iy], area.bottom(), area.top);
        let py_hi = y_axis.data_to_pixel(hist.y_edges[iy + 1], area.bottom(), area.top);
        for ix in 0..hist.x.bins {
            let Some(t) = norm.scale(hist.count(ix, iy)) else {
                continue;
            };
            let px_lo = x_axis.data_to_pixel(hist.x_edges[ix], area.left, area.right());
            let px_hi = x_axis.data_to_pixel(hist.x_edges[ix + 1], area.left, area.right());
            let color = viridis(t);
            // Hairline stroke in the fill color hides antialiasing seams.
            let style = Style { fill: Some(color), stroke: Some(color), stroke_width: 0.3 };
            canvas.rect(px_lo, py_hi, px_hi - px_lo, py_lo - py_hi, &style);
        }
    }
}

/// Horizontal space the colorbar needs to the right of the plot area.
pub fn colorbar_reserve(canvas: &Canvas, axis: &Axis, config: &VizConfig) -> f64 {
    let style = tick_text_style(config);
    let max_label = axis
        .tick_labels
        .iter()
        .map(|l| canvas.measure_text(l, &style).width)
        .fold(0.0_f64, f64::max);
    BAR_GAP + BAR_WIDTH + config.axes.tick_length + TICK_LABEL_GAP + max_label
}

/// Vertical colorbar right of `area`.
pub fn draw_colorbar(canvas: &mut Canvas, area: &PlotArea, norm: Norm, config: &VizConfig) {
    let axis = norm.axis();
    let bar = PlotArea::manual(area.right() + BAR_GAP, area.top, BAR_WIDTH, area.height);
    let step_h = bar.height / BAR_STEPS as f64;
    for i in 0..BAR_STEPS {
        let t = (i as f64 + 0.5) / BAR_STEPS as f64;
        let color = viridis(t);
        let y = bar.bottom() - (i as f64 + 1.0) * step_h;
        let style = Style { fill: Some(color), stroke: Some(color), stroke_width: 0.3 };
        canvas.rect(bar.left, y, bar.width, step_h, &style);
    }
    draw_frame(canvas, &bar, config.axes.line_width);

    let tick_line = LineStyle::solid(Color::rgb(0, 0, 0), config.axes.line_width);
    let label_style = TextStyle {
        anchor: TextAnchor::Start,
        baseline: TextBaseline::Central,
        ..tick_text_style(config)
    };
    for (i, &val) in axis.tick_positions.iter().enumerate() {
        let py = axis.data_to_pixel(val, bar.bottom(), bar.top);
        if py < bar.top - 0.5 || py > bar.bottom() + 0.5 {
            continue;
        }
        canvas.line(bar.right(), py, bar.right() + config.axes.tick_length, py, &tick_line);
        if let Some(label) = axis.tick_labels.get(i) {
            let x = bar.right() + config.axes.tick_length + TICK_LABEL_GAP;
            canvas.text(x, py, label, &label_style);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::font::FontHandle;
    use crate::hist::Binning;

    fn hist() -> Histogram2D {
        let b = Binning::new(0.0, 2.0, 2).unwrap();
        Histogram2D::fill(&[0.5, 0.5, 0.5, 0.5, 1.5], &[0.5, 0.5, 0.5, 0.5, 0.5], b, b).unwrap()
    }

    #[test]
    fn linear_norm_keeps_empty_bins() {
        let norm = Norm::for_hist(&hist(), false);
        assert_eq!(norm, Norm::Linear { max: 4.0 });
        assert_eq!(norm.scale(0.0), Some(0.0));
        assert_eq!(norm.scale(2.0), Some(0.5));
    }

    #[test]
    fn log_norm_blanks_empty_bins() {
        let norm = Norm::for_hist(&hist(), true);
        assert_eq!(norm, Norm::Log { min: 1.0, max: 4.0 });
        assert_eq!(norm.scale(0.0), None);
        assert_eq!(norm.scale(1.0), Some(0.0));
        assert!((norm.scale(2.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn log_cells_skip_empty_bins() {
        let h = hist();
        let mut canvas = Canvas::new(200.0, 200.0, Arc::new(FontHandle::empty()));
        let area = PlotArea::manual(0.0, 0.0, 200.0, 200.0);
        let x = Axis::ranged(0.0, 2.0, 3);
        draw_hist2d(&mut canvas, &area, &x, &x, &h, Norm::for_hist(&h, true));
        let svg = canvas.finish_svg();
        // background plus two occupied bins
        assert_eq!(svg.matches("<rect").count(), 3);
    }
}
