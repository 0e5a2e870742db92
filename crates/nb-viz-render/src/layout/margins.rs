use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Outer padding around the decorated plot.
const PAD: f64 = 6.0;
/// Gap between the frame and tick labels.
pub const TICK_LABEL_GAP: f64 = 4.0;
/// Gap between tick labels and the axis label.
pub const AXIS_LABEL_GAP: f64 = 4.0;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Tight layout: margins sized from the measured tick labels, axis labels
    /// and title. `reserve_right` keeps room for a colorbar.
    pub fn tight(
        canvas: &Canvas,
        x_axis: &Axis,
        y_axis: &Axis,
        title: Option<&str>,
        reserve_right: f64,
        config: &VizConfig,
    ) -> Self {
        let tick_style = tick_text_style(config);
        let label_style = label_text_style(config);

        let max_y_tick = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = PAD + TICK_LABEL_GAP + max_y_tick;
        if !y_axis.label.is_empty() {
            left += AXIS_LABEL_GAP + canvas.measure_text(&y_axis.label, &label_style).height;
        }

        let mut bottom = PAD + TICK_LABEL_GAP + canvas.measure_text("0", &tick_style).height;
        if !x_axis.label.is_empty() {
            bottom += AXIS_LABEL_GAP + canvas.measure_text(&x_axis.label, &label_style).height;
        }

        let top = match title.filter(|t| !t.is_empty()) {
            Some(t) => {
                let title_style = title_text_style(config);
                PAD + canvas.measure_text(t, &title_style).height + PAD
            }
            None => PAD + canvas.measure_text("0", &tick_style).height / 2.0,
        };

        // The last x tick label is centered on the right edge.
        let last_x_tick = x_axis
            .tick_labels
            .last()
            .map(|l| canvas.measure_text(l, &tick_style).width / 2.0)
            .unwrap_or(0.0);
        let right = PAD + last_x_tick.max(reserve_right);

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }

    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

pub fn tick_text_style(config: &VizConfig) -> TextStyle {
    TextStyle { size: config.font.tick_size, weight: config.font.weight, ..Default::default() }
}

pub fn label_text_style(config: &VizConfig) -> TextStyle {
    TextStyle { size: config.font.label_size, weight: config.font.weight, ..Default::default() }
}

pub fn title_text_style(config: &VizConfig) -> TextStyle {
    TextStyle { size: config.font.title_size, weight: config.font.weight, ..Default::default() }
}
