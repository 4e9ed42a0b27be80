//! Residual diagnostics reported beneath the coefficient table.

use crate::error::Result;
use crate::inference::chi_squared_sf;
use serde::{Deserialize, Serialize};

/// Normality and autocorrelation checks on regression residuals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualDiagnostics {
    /// D'Agostino-Pearson omnibus K² statistic
    pub omnibus: f64,
    /// χ²(2) p-value of the omnibus statistic
    pub omnibus_pvalue: f64,
    /// Jarque-Bera statistic
    pub jarque_bera: f64,
    /// χ²(2) p-value of the Jarque-Bera statistic
    pub jarque_bera_pvalue: f64,
    /// Sample skewness (biased)
    pub skew: f64,
    /// Sample kurtosis (biased, normal = 3)
    pub kurtosis: f64,
    /// Durbin-Watson statistic
    pub durbin_watson: f64,
}

impl ResidualDiagnostics {
    /// Compute all diagnostics for a residual series.
    pub fn from_residuals(resid: &[f64]) -> Result<Self> {
        let (skew, kurtosis) = moments(resid);
        let jarque_bera = jarque_bera_stat(resid.len(), skew, kurtosis);
        let omnibus = omnibus_stat(resid.len(), skew, kurtosis);
        Ok(Self {
            omnibus,
            omnibus_pvalue: chi_squared_sf(omnibus, 2.0)?,
            jarque_bera,
            jarque_bera_pvalue: chi_squared_sf(jarque_bera, 2.0)?,
            skew,
            kurtosis,
            durbin_watson: durbin_watson(resid),
        })
    }
}

/// `Σ (e_t − e_{t−1})² / Σ e_t²`
pub fn durbin_watson(resid: &[f64]) -> f64 {
    let ssr: f64 = resid.iter().map(|e| e * e).sum();
    let diff: f64 = resid.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    diff / ssr
}

/// Biased skewness and (non-excess) kurtosis.
pub fn moments(x: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    if x.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = x.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &v in x {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;
    (m3 / m2.powf(1.5), m4 / (m2 * m2))
}

fn jarque_bera_stat(n: usize, skew: f64, kurtosis: f64) -> f64 {
    n as f64 / 6.0 * (skew * skew + (kurtosis - 3.0).powi(2) / 4.0)
}

/// D'Agostino's transformed skewness Z₁.
fn skew_z(n: f64, skew: f64) -> f64 {
    let y = skew * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

/// Anscombe-Glynn transformed kurtosis Z₂.
fn kurtosis_z(n: f64, kurtosis: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (kurtosis - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Omnibus `Z₁² + Z₂²`; undefined below eight observations.
fn omnibus_stat(n: usize, skew: f64, kurtosis: f64) -> f64 {
    if n < 8 {
        return f64::NAN;
    }
    let n = n as f64;
    let z1 = skew_z(n, skew);
    let z2 = kurtosis_z(n, kurtosis);
    z1 * z1 + z2 * z2
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_durbin_watson_alternating() {
        // Differences are ±2, squares 4; three of them over SSR 4
        let resid = [1.0, -1.0, 1.0, -1.0];
        assert_relative_eq!(durbin_watson(&resid), 3.0);
    }

    #[test]
    fn test_durbin_watson_constant() {
        let resid = [0.5, 0.5, 0.5];
        assert_relative_eq!(durbin_watson(&resid), 0.0);
    }

    #[test]
    fn test_moments_symmetric() {
        let (skew, kurt) = moments(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_relative_eq!(skew, 0.0, epsilon = 1e-15);
        // m2 = 2, m4 = 6.8
        assert_relative_eq!(kurt, 1.7, epsilon = 1e-12);
    }

    #[test]
    fn test_moments_right_skewed() {
        let (skew, _) = moments(&[0.0, 0.0, 0.0, 10.0]);
        assert!(skew > 0.0);
    }

    #[test]
    fn test_jarque_bera() {
        let jb = jarque_bera_stat(60, 0.5, 4.0);
        // 10 * (0.25 + 0.25)
        assert_relative_eq!(jb, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_omnibus_small_sample() {
        assert!(omnibus_stat(7, 0.1, 3.0).is_nan());
    }

    #[test]
    fn test_diagnostics_from_residuals() {
        let resid: Vec<f64> = (0..40)
            .map(|i| ((i * 37 % 17) as f64 - 8.0) / 100.0)
            .collect();
        let diag = ResidualDiagnostics::from_residuals(&resid).unwrap();
        assert!(diag.omnibus.is_finite() && diag.omnibus >= 0.0);
        assert!((0.0..=1.0).contains(&diag.omnibus_pvalue));
        assert!((0.0..=1.0).contains(&diag.jarque_bera_pvalue));
        assert!(diag.durbin_watson > 0.0 && diag.durbin_watson < 4.0);
    }
}
