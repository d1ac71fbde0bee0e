use serde::{Deserialize, Serialize};

/// Mean, sample standard deviation and size of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub mean: f64,
    pub std_dev: f64,
    pub n_vals: usize,
}

impl GroupStats {
    /// Same estimators as [`compute_mean`] and [`compute_std`].
    pub fn from_slice(vals: &[f64]) -> Self {
        Self {
            mean: compute_mean(vals),
            std_dev: compute_std(vals),
            n_vals: vals.len(),
        }
    }
}

/// A statistic over the whole series and its before/after groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub overall: f64,
    pub before: f64,
    pub after: f64,
}

impl Triple {
    pub fn to_array(self) -> [f64; 3] {
        [self.overall, self.before, self.after]
    }
}

/// Observation counts over the whole series and its before/after groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub overall: usize,
    pub before: usize,
    pub after: usize,
}

impl Counts {
    pub fn to_array(self) -> [usize; 3] {
        [self.overall, self.before, self.after]
    }
}

/// Triples for the treated and the control series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub series: Triple,
    pub control_series: Triple,
}

/// Arithmetic mean, NaN when empty.
pub fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Unbiased sample variance (ddof = 1), NaN with fewer than two values.
pub fn compute_var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = compute_mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

pub fn compute_std(vals: &[f64]) -> f64 {
    compute_var(vals).sqrt()
}
