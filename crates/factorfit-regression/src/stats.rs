//! Column summaries and kernel density estimation.
//!
//! Missing observations are encoded as `NaN` and skipped.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Summary of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    /// Non-missing observations
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n − 1)
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// 25th percentile
    pub q25: f64,
    /// Median
    pub median: f64,
    /// 75th percentile
    pub q75: f64,
    /// Maximum
    pub max: f64,
}

/// Sample standard deviation of non-missing values.
fn sample_std(values: &[f64]) -> f64 {
    let data: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if data.len() < 2 {
        return f64::NAN;
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
}

/// Scott's rule bandwidth `σ · n^(−1/5)`.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.iter().filter(|v| !v.is_nan()).count() as f64;
    sample_std(values) * n.powf(-0.2)
}

/// Gaussian kernel density estimate evaluated on `grid`.
///
/// Returns `None` when the data has fewer than two points or zero spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let data: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let h = scott_bandwidth(&data);
    if data.len() < 2 || !h.is_finite() || h <= 0.0 {
        return None;
    }
    let norm = 1.0 / (data.len() as f64 * h * (2.0 * PI).sqrt());
    Some(
        grid.iter()
            .map(|&x| {
                data.iter()
                    .map(|&xi| (-0.5 * ((x - xi) / h).powi(2)).exp())
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}
