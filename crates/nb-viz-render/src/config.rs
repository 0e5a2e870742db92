use serde::Deserialize;

use crate::primitives::FontWeight;

/// Top-level rendering configuration (YAML or programmatic).
///
/// Lengths are in points (1/72"); the PNG is rasterized at `output.dpi`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub output: OutputConfig,
}

impl VizConfig {
    /// PNG scale factor from canvas points to pixels.
    pub fn pixel_scale(&self) -> f64 {
        self.output.dpi as f64 / 72.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 460.8,  // 6.4" * 72
            height: 345.6, // 4.8" * 72
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub weight: FontWeight,
    pub size: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
    pub legend_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            weight: FontWeight::Bold,
            size: 16.0,
            title_size: 19.2,
            label_size: 16.0,
            tick_size: 16.0,
            legend_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
    pub line_width: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 3.5,
            minor_tick_length: 2.0,
            line_width: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dpi: 100 }
    }
}
