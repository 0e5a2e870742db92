use crate::canvas::Canvas;
use crate::color::{Color, FILL_ALPHA};
use crate::hist::Histogram1D;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::Style;

/// Edge width of histogram outlines, in points.
const EDGE_WIDTH: f64 = 1.0;

/// Draw a step-filled histogram: translucent body, opaque outline.
///
/// On a log axis empty bins are not drawn, so the outline breaks into one
/// polygon per run of non-empty bins.
pub fn draw_hist1d(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    hist: &Histogram1D,
    color: Color,
) {
    let style = Style {
        fill: Some(color.with_alpha(FILL_ALPHA)),
        stroke: Some(color),
        stroke_width: EDGE_WIDTH,
    };
    let base = if y_axis.log { y_axis.min } else { 0.0 };
    for run in bin_runs(hist, y_axis.log) {
        let points = step_outline(hist, run, base, |x, y| {
            (
                x_axis.data_to_pixel(x, area.left, area.right()),
                y_axis.data_to_pixel(y, area.bottom(), area.top),
            )
        });
        canvas.polygon(&points, &style);
    }
}

/// Ranges of bins to draw as one polygon.
fn bin_runs(hist: &Histogram1D, skip_empty: bool) -> Vec<std::ops::Range<usize>> {
    let n = hist.counts.len();
    if !skip_empty {
        return if n == 0 { Vec::new() } else { vec![0..n] };
    }
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &c) in hist.counts.iter().enumerate() {
        match (c > 0.0, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..n);
    }
    runs
}

/// Closed step outline over `run`, from the baseline up and back down.
fn step_outline(
    hist: &Histogram1D,
    run: std::ops::Range<usize>,
    base: f64,
    to_px: impl Fn(f64, f64) -> (f64, f64),
) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(2 * run.len() + 2);
    points.push(to_px(hist.edges[run.start], base));
    for i in run.clone() {
        points.push(to_px(hist.edges[i], hist.counts[i]));
        points.push(to_px(hist.edges[i + 1], hist.counts[i]));
    }
    points.push(to_px(hist.edges[run.end], base));
    points
}
