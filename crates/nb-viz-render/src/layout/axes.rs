/// Axis limits with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Linear axis over exactly `[min, max]` with "nice number" ticks inside it.
    pub fn ranged(min: f64, max: f64, target_ticks: usize) -> Self {
        let (min, max) = if (max - min).abs() < 1e-15 { (min - 1.0, max + 1.0) } else { (min, max) };
        let step = nice_step((max - min) / (target_ticks.max(2) - 1) as f64);

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let first = (min / step - 1e-9).ceil() as i64;
        let last = (max / step + 1e-9).floor() as i64;
        for k in first..=last {
            let v = k as f64 * step;
            ticks.push(v);
            labels.push(format_tick(v, step));
        }

        let minor_step = step / 5.0;
        let mut minor = Vec::new();
        let first = (min / minor_step - 1e-9).ceil() as i64;
        let last = (max / minor_step + 1e-9).floor() as i64;
        for k in first..=last {
            let v = k as f64 * minor_step;
            if !ticks.iter().any(|t| (t - v).abs() < minor_step * 0.01) {
                minor.push(v);
            }
        }

        Self {
            min,
            max,
            log: false,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Count axis: `[0, 1.05 * max_count]`, or `[0, 1]` for an empty histogram.
    pub fn counts(max_count: f64, target_ticks: usize) -> Self {
        let top = if max_count > 0.0 { max_count * 1.05 } else { 1.0 };
        Self::ranged(0.0, top, target_ticks)
    }

    /// Auto-scale logarithmic axis over whole decades.
    pub fn auto_log(data_min: f64, data_max: f64) -> Self {
        let log_min = data_min.max(1e-20).log10().floor() as i32;
        let mut log_max = data_max.max(1e-20).log10().ceil() as i32;
        if log_max <= log_min {
            log_max = log_min + 1;
        }

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let mut minor = Vec::new();

        for exp in log_min..=log_max {
            ticks.push(10.0_f64.powi(exp));
            labels.push(format!("10{}", superscript(exp)));
            if exp < log_max {
                for m in 2..=9 {
                    minor.push(m as f64 * 10.0_f64.powi(exp));
                }
            }
        }

        Self {
            min: 10.0_f64.powi(log_min),
            max: 10.0_f64.powi(log_max),
            log: true,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = if self.log {
            let log_val = value.max(1e-20).ln();
            let log_min = self.min.max(1e-20).ln();
            let log_max = self.max.max(1e-20).ln();
            (log_val - log_min) / (log_max - log_min)
        } else {
            (value - self.min) / (self.max - self.min)
        };
        px_min + frac * (px_max - px_min)
    }
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    if decimals == 0 {
        // Avoid "-0"
        let v = if value.abs() < step * 0.01 { 0.0 } else { value };
        format!("{}", v.round() as i64)
    } else {
        format!("{:.prec$}", value, prec = decimals)
    }
}

fn superscript(n: i32) -> String {
    n.to_string()
        .chars()
        .map(|c| match c {
            '-' => '\u{207B}',
            '0' => '\u{2070}',
            '1' => '\u{00B9}',
            '2' => '\u{00B2}',
            '3' => '\u{00B3}',
            '4' => '\u{2074}',
            '5' => '\u{2075}',
            '6' => '\u{2076}',
            '7' => '\u{2077}',
            '8' => '\u{2078}',
            '9' => '\u{2079}',
            _ => c,
        })
        .collect()
}
