use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;
use crate::{RenderError, Result};

/// Legend placement inside the plot area.
///
/// The numeric codes are the matplotlib `loc` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendLocation {
    #[default]
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    UpperCenter,
}

impl LegendLocation {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::UpperRight),
            2 => Ok(Self::UpperLeft),
            3 => Ok(Self::LowerLeft),
            4 => Ok(Self::LowerRight),
            9 => Ok(Self::UpperCenter),
            other => Err(RenderError::Layout(format!("unsupported legend location code {other}"))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::UpperRight => 1,
            Self::UpperLeft => 2,
            Self::LowerLeft => 3,
            Self::LowerRight => 4,
            Self::UpperCenter => 9,
        }
    }

    /// Top-left corner of a `w` x `h` box placed `pad` inside `area`.
    fn anchor(self, area: &PlotArea, w: f64, h: f64, pad: f64) -> (f64, f64) {
        let left = area.left + pad;
        let right = area.right() - w - pad;
        let center = area.left + (area.width - w) / 2.0;
        let top = area.top + pad;
        let bottom = area.bottom() - h - pad;
        match self {
            Self::UpperRight => (right, top),
            Self::UpperLeft => (left, top),
            Self::LowerLeft => (left, bottom),
            Self::LowerRight => (right, bottom),
            Self::UpperCenter => (center, top),
        }
    }
}

/// One histogram entry: a translucent swatch with an opaque edge.
#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub label: String,
    pub fill: Color,
    pub edge: Color,
}

/// Draw a legend at `location` in the plot area.
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    location: LegendLocation,
    text_style: &TextStyle,
) {
    if entries.is_empty() {
        return;
    }

    let size = text_style.size;
    let row_height = size * 1.3;
    let swatch_w = size * 1.6;
    let swatch_h = size * 0.7;
    let gap = size * 0.5;
    let padding = size * 0.4;

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, text_style).width)
        .fold(0.0_f64, f64::max);

    let legend_w = padding + swatch_w + gap + max_w + padding;
    let legend_h = padding + entries.len() as f64 * row_height + padding;
    let (lx, ly) = location.anchor(area, legend_w, legend_h, 5.0);

    let bg_style = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.8)),
        stroke: Some(Color::rgb(204, 204, 204)),
        stroke_width: 0.8,
    };
    canvas.rect(lx, ly, legend_w, legend_h, &bg_style);

    let label_style = TextStyle { baseline: TextBaseline::Central, anchor: TextAnchor::Start, ..text_style.clone() };
    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + padding + (i as f64 + 0.5) * row_height;
        let sx = lx + padding;
        let swatch = Style { fill: Some(entry.fill), stroke: Some(entry.edge), stroke_width: 1.0 };
        canvas.rect(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, &swatch);
        canvas.text(sx + swatch_w + gap, ey, &entry.label, &label_style);
    }
}
