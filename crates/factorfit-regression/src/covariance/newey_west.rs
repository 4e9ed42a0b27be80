//! Newey-West HAC (Heteroskedasticity and Autocorrelation Consistent) Covariance Estimator
//!
//! Monthly return regressions often have serially correlated residuals. The
//! Newey-West estimator builds the sandwich meat from the scores
//! `s_t = x_t · u_t` and their lagged cross-products with Bartlett weights:
//! ```text
//! M = Γ_0 + Σ_{l=1}^{L} w_l * (Γ_l + Γ_l^T)
//! where:
//! - Γ_l = Σ_{t=l+1}^T s_t s_{t-l}^T
//! - w_l = 1 - l/(L+1) (Bartlett kernel weights)
//! - L = lag count (automatic: ceil(4*(T/100)^(2/9)))
//! ```
//!
//! No small-sample correction is applied.
//!
//! # References
//! - Newey, W. K., & West, K. D. (1987). "A Simple, Positive Semi-Definite,
//!   Heteroskedasticity and Autocorrelation Consistent Covariance Matrix."
//!   Econometrica, 55(3), 703-708.

use super::{CovarianceError, FitContext, ParameterCovariance};
use ndarray::{Array2, Axis, s};
use serde::{Deserialize, Serialize};

/// Newey-West covariance estimator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeweyWestConfig {
    /// Number of lags to use for HAC adjustment (None = automatic selection)
    /// When None, uses ceil(4*(T/100)^(2/9)) as recommended by Newey-West
    pub lags: Option<usize>,
}

/// Newey-West HAC covariance estimator
#[derive(Debug, Default)]
pub struct NeweyWestEstimator {
    config: NeweyWestConfig,
}

impl NeweyWestEstimator {
    /// Create a new Newey-West estimator with the given configuration
    pub const fn new(config: NeweyWestConfig) -> Self {
        Self { config }
    }

    /// Lag length for a sample of `n_periods` observations.
    ///
    /// Uses the configured value if present, otherwise `ceil(4 * (T/100)^(2/9))`.
    pub fn optimal_lags(&self, n_periods: usize) -> usize {
        self.config.lags.unwrap_or_else(|| {
            let t = n_periods as f64;
            let lags = 4.0 * (t / 100.0).powf(2.0 / 9.0);
            lags.ceil() as usize
        })
    }

    /// Bartlett kernel weight `1 - l/(L+1)`, zero beyond `max_lag`.
    pub fn bartlett_weight(&self, lag: usize, max_lag: usize) -> f64 {
        if lag == 0 {
            1.0
        } else if lag <= max_lag {
            1.0 - (lag as f64) / (max_lag as f64 + 1.0)
        } else {
            0.0
        }
    }

    /// `Γ_l = Σ_{t=l}^{T-1} s_t s_{t-l}ᵀ` for a score matrix (T × k).
    fn lagged_cross_product(scores: &Array2<f64>, lag: usize) -> Array2<f64> {
        let n = scores.nrows();
        let current = scores.slice(s![lag..n, ..]);
        let lagged = scores.slice(s![0..n - lag, ..]);
        current.t().dot(&lagged)
    }
}

impl ParameterCovariance for NeweyWestEstimator {
    fn estimate(&self, ctx: &FitContext<'_>) -> Result<Array2<f64>, CovarianceError> {
        let (n_periods, _) = ctx.check()?;
        if n_periods < 2 {
            return Err(CovarianceError::InsufficientData {
                required: 2,
                actual: n_periods,
            });
        }

        // Never use more lags than the sample supports
        let max_lag = self.optimal_lags(n_periods).min(n_periods - 1);

        let scores = ctx.exog * &ctx.resid.view().insert_axis(Axis(1));
        let mut meat = Self::lagged_cross_product(&scores, 0);

        for lag in 1..=max_lag {
            let weight = self.bartlett_weight(lag, max_lag);
            let gamma = Self::lagged_cross_product(&scores, lag);
            meat = meat + (&gamma + &gamma.t()) * weight;
        }

        Ok(ctx.sandwich(&meat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::{HeteroskedasticCovariance, HeteroskedasticKind};
    use crate::linalg::invert_spd;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    fn context<'a>(
        exog: &'a Array2<f64>,
        resid: &'a Array1<f64>,
        xtx_inv: &'a Array2<f64>,
    ) -> FitContext<'a> {
        FitContext {
            exog,
            resid,
            xtx_inv,
            df_resid: exog.nrows() - exog.ncols(),
        }
    }

    #[test]
    fn test_newey_west_config_default() {
        let config = NeweyWestConfig::default();
        assert!(config.lags.is_none());
    }

    #[test]
    fn test_optimal_lags() {
        let estimator = NeweyWestEstimator::default();

        // ceil(4 * (100/100)^(2/9)) = 4
        assert_eq!(estimator.optimal_lags(100), 4);

        // 5^(2/9) ≈ 1.427, so ceil(5.71) = 6
        assert_eq!(estimator.optimal_lags(500), 6);

        // 10^(2/9) ≈ 1.668, so ceil(6.67) = 7
        assert_eq!(estimator.optimal_lags(1000), 7);
    }

    #[test]
    fn test_optimal_lags_manual() {
        let estimator = NeweyWestEstimator::new(NeweyWestConfig { lags: Some(10) });

        // Should use manual setting regardless of T
        assert_eq!(estimator.optimal_lags(100), 10);
        assert_eq!(estimator.optimal_lags(500), 10);
    }

    #[test]
    fn test_bartlett_weight() {
        let estimator = NeweyWestEstimator::default();
        let max_lag = 4;

        assert_relative_eq!(estimator.bartlett_weight(0, max_lag), 1.0);
        assert_relative_eq!(estimator.bartlett_weight(1, max_lag), 0.8);
        assert_relative_eq!(estimator.bartlett_weight(2, max_lag), 0.6);
        assert_relative_eq!(estimator.bartlett_weight(3, max_lag), 0.4);
        assert_relative_eq!(estimator.bartlett_weight(4, max_lag), 0.2);
        // Beyond max_lag
        assert_relative_eq!(estimator.bartlett_weight(5, max_lag), 0.0);
    }

    #[test]
    fn test_zero_lags_matches_hc0() {
        let exog = array![
            [1.0, 0.3],
            [1.0, -0.2],
            [1.0, 0.5],
            [1.0, 0.1],
            [1.0, -0.4],
            [1.0, 0.0]
        ];
        let resid = array![0.02, -0.01, 0.03, -0.02, 0.01, -0.03];
        let xtx_inv = invert_spd(&exog.t().dot(&exog)).unwrap();
        let ctx = context(&exog, &resid, &xtx_inv);

        let hac = NeweyWestEstimator::new(NeweyWestConfig { lags: Some(0) })
            .estimate(&ctx)
            .unwrap();
        let hc0 = HeteroskedasticCovariance::new(HeteroskedasticKind::HC0)
            .estimate(&ctx)
            .unwrap();

        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(hac[[i, j]], hc0[[i, j]], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_intercept_only_by_hand() {
        // Scores are the residuals themselves; (XᵀX)⁻¹ = 1/n
        let exog = Array2::ones((4, 1));
        let resid = array![1.0, 2.0, -1.0, -2.0];
        let xtx_inv = array![[0.25]];
        let ctx = context(&exog, &resid, &xtx_inv);

        let cov = NeweyWestEstimator::new(NeweyWestConfig { lags: Some(1) })
            .estimate(&ctx)
            .unwrap();

        // Γ_0 = 10, Γ_1 = 1·2 + 2·(-1) + (-1)·(-2) = 2, w_1 = 0.5
        let meat = 10.0 + 0.5 * (2.0 + 2.0);
        assert_relative_eq!(cov[[0, 0]], meat / 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_positive_autocorrelation_widens_variance() {
        let n = 60;
        let exog = Array2::ones((n, 1));
        // Slowly varying residuals: strong positive serial correlation
        let resid: Array1<f64> = (0..n)
            .map(|t| ((t as f64) * 0.2).sin() * 0.01)
            .collect();
        let xtx_inv = array![[1.0 / n as f64]];
        let ctx = context(&exog, &resid, &xtx_inv);

        let hac = NeweyWestEstimator::new(NeweyWestConfig { lags: Some(4) })
            .estimate(&ctx)
            .unwrap();
        let hc0 = HeteroskedasticCovariance::new(HeteroskedasticKind::HC0)
            .estimate(&ctx)
            .unwrap();
        assert!(hac[[0, 0]] > hc0[[0, 0]]);
    }

    #[test]
    fn test_symmetric() {
        let exog = array![
            [1.0, 0.3, 0.1],
            [1.0, -0.2, 0.0],
            [1.0, 0.5, -0.3],
            [1.0, 0.1, 0.2],
            [1.0, -0.4, 0.4],
            [1.0, 0.0, -0.1],
            [1.0, 0.2, 0.3]
        ];
        let resid = array![0.02, -0.01, 0.03, -0.02, 0.01, -0.03, 0.0];
        let xtx_inv = invert_spd(&exog.t().dot(&exog)).unwrap();
        let ctx = context(&exog, &resid, &xtx_inv);
        let cov = NeweyWestEstimator::default().estimate(&ctx).unwrap();

        assert_eq!(cov.shape(), &[3, 3]);
        for i in 0..3 {
            assert!(cov[[i, i]] >= 0.0);
            for j in 0..3 {
                assert_relative_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_large_lag_clamping() {
        let exog = Array2::ones((5, 1));
        let resid = array![0.01, -0.01, 0.02, 0.0, -0.02];
        let xtx_inv = array![[0.2]];
        let ctx = context(&exog, &resid, &xtx_inv);

        let result = NeweyWestEstimator::new(NeweyWestConfig { lags: Some(100) }).estimate(&ctx);
        assert!(result.is_ok());
    }

    #[test]
    fn test_insufficient_data() {
        let exog = Array2::ones((1, 1));
        let resid = array![0.0];
        let xtx_inv = array![[1.0]];
        let ctx = context(&exog, &resid, &xtx_inv);
        assert!(matches!(
            NeweyWestEstimator::default().estimate(&ctx),
            Err(CovarianceError::InsufficientData { .. })
        ));
    }
}
