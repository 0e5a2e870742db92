use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn hex(s: &str) -> Self {
        let s = s.strip_prefix('#').unwrap_or(s);
        let channel = |i: usize| s.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok()).unwrap_or(0);
        Self { r: channel(0), g: channel(2), b: channel(4), a: 1.0 }
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn is_opaque(&self) -> bool {
        (self.a - 1.0).abs() < 1e-6
    }

    /// `#rrggbb`; alpha is written separately as `fill-opacity`/`stroke-opacity`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors (for colormaps).
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: (a.r as f64 * (1.0 - t) + b.r as f64 * t).round() as u8,
            g: (a.g as f64 * (1.0 - t) + b.g as f64 * t).round() as u8,
            b: (a.b as f64 * (1.0 - t) + b.b as f64 * t).round() as u8,
            a: a.a * (1.0 - t) + b.a * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Color::hex(&s))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

/// Which simulation stage a series comes from. Fixes its color and legend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Generator-level truth.
    Truth,
    /// Reconstruction run on MC-matched objects.
    McReco,
    /// Full reconstruction.
    Reco,
}

impl Role {
    pub const fn color(self) -> Color {
        match self {
            Role::Truth => Color::rgb(0, 128, 0),
            Role::McReco => Color::rgb(0, 0, 255),
            Role::Reco => Color::rgb(255, 0, 0),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Truth => "MC Truth",
            Role::McReco => "MC Reco",
            Role::Reco => "Reconstructed",
        }
    }
}

/// Fill alpha of histogram bodies; edges stay opaque.
pub const FILL_ALPHA: f64 = 0.4;

// --- Sequential colormap for 2-D histograms ---

/// Viridis control points, evenly spaced on [0, 1].
const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (72, 40, 120),
    (62, 74, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (110, 206, 88),
    (181, 222, 43),
    (253, 231, 37),
];

/// Viridis colormap: 0.0 → dark purple, 1.0 → yellow.
pub fn viridis(t: f64) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    Color::lerp(Color::rgb(a.0, a.1, a.2), Color::rgb(b.0, b.1, b.2), scaled - i as f64)
}
