//! Fixed-width histograms over half-open ranges.

use crate::{RenderError, Result};

/// `bins` equal-width bins covering `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    pub low: f64,
    pub high: f64,
    pub bins: usize,
}

impl Binning {
    pub fn new(low: f64, high: f64, bins: usize) -> Result<Self> {
        if bins == 0 || !low.is_finite() || !high.is_finite() || low >= high {
            return Err(RenderError::Layout(format!(
                "invalid binning: {bins} bins over [{low}, {high})"
            )));
        }
        Ok(Self { low, high, bins })
    }

    /// Bin edges, `bins + 1` of them.
    pub fn edges(&self) -> Vec<f64> {
        let width = (self.high - self.low) / self.bins as f64;
        (0..=self.bins)
            .map(|i| if i == self.bins { self.high } else { self.low + i as f64 * width })
            .collect()
    }
}

/// Bin index of `val` given sorted edges. `None` for underflow, overflow and NaN.
fn find_bin(edges: &[f64], val: f64) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if val.is_nan() || val < first || val >= last {
        return None;
    }
    match edges.binary_search_by(|e| e.total_cmp(&val)) {
        Ok(i) => (i < edges.len() - 1).then_some(i),
        Err(i) => (i > 0 && i < edges.len()).then(|| i - 1),
    }
}

/// One-dimensional histogram. Values outside `[low, high)` are not binned.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    pub binning: Binning,
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
    /// Values below `low`.
    pub underflow: u64,
    /// Values at or above `high`, and NaNs.
    pub overflow: u64,
}

impl Histogram1D {
    pub fn fill(values: &[f64], binning: Binning) -> Self {
        let edges = binning.edges();
        let mut counts = vec![0.0; binning.bins];
        let (mut underflow, mut overflow) = (0, 0);
        for &v in values {
            match find_bin(&edges, v) {
                Some(i) => counts[i] += 1.0,
                None if v < binning.low => underflow += 1,
                None => overflow += 1,
            }
        }
        Self { binning, edges, counts, underflow, overflow }
    }

    /// Number of binned values.
    pub fn entries(&self) -> f64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> f64 {
        self.counts.iter().copied().fold(0.0, f64::max)
    }

    /// Smallest non-zero count, for log axes.
    pub fn min_positive(&self) -> Option<f64> {
        self.counts.iter().copied().filter(|&c| c > 0.0).reduce(f64::min)
    }

    pub fn summary(&self) -> FillSummary {
        FillSummary { entries: self.entries(), underflow: self.underflow, overflow: self.overflow }
    }
}

/// Where the values of one fill ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillSummary {
    pub entries: f64,
    pub underflow: u64,
    pub overflow: u64,
}

impl FillSummary {
    pub fn excluded(&self) -> u64 {
        self.underflow + self.overflow
    }
}

/// Two-dimensional histogram of parallel `(x, y)` series.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    pub x: Binning,
    pub y: Binning,
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    /// Row-major counts: `counts[iy * x.bins + ix]`.
    pub counts: Vec<f64>,
    /// Pairs with either coordinate outside its range.
    pub outside: u64,
}

impl Histogram2D {
    pub fn fill(xs: &[f64], ys: &[f64], x: Binning, y: Binning) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(RenderError::Layout(format!(
                "2-D histogram needs parallel series, got {} x values and {} y values",
                xs.len(),
                ys.len()
            )));
        }
        let x_edges = x.edges();
        let y_edges = y.edges();
        let mut counts = vec![0.0; x.bins * y.bins];
        let mut outside = 0;
        for (&vx, &vy) in xs.iter().zip(ys) {
            match (find_bin(&x_edges, vx), find_bin(&y_edges, vy)) {
                (Some(ix), Some(iy)) => counts[iy * x.bins + ix] += 1.0,
                _ => outside += 1,
            }
        }
        Ok(Self { x, y, x_edges, y_edges, counts, outside })
    }

    pub fn count(&self, ix: usize, iy: usize) -> f64 {
        self.counts[iy * self.x.bins + ix]
    }

    pub fn max_count(&self) -> f64 {
        self.counts.iter().copied().fold(0.0, f64::max)
    }
}
