//! Heteroskedasticity-consistent (White / MacKinnon-White) covariance.
//!
//! The meat is `Xᵀ diag(ω) X` with per-observation weights:
//!
//! ```text
//! HC0: ω_i = u_i²
//! HC1: ω_i = u_i² · n / (n − k)
//! HC2: ω_i = u_i² / (1 − h_i)
//! HC3: ω_i = u_i² / (1 − h_i)²
//! ```
//!
//! # References
//! - White, H. (1980). "A Heteroskedasticity-Consistent Covariance Matrix
//!   Estimator and a Direct Test for Heteroskedasticity." Econometrica 48(4).
//! - MacKinnon, J. G., & White, H. (1985). "Some heteroskedasticity-consistent
//!   covariance matrix estimators with improved finite sample properties."
//!   Journal of Econometrics 29(3).

use super::{CovarianceError, FitContext, ParameterCovariance};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Leverage within this distance of 1 is treated as exactly 1.
const UNIT_LEVERAGE_TOLERANCE: f64 = 1e-12;

/// Which HC variant to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeteroskedasticKind {
    /// Squared residuals.
    HC0,
    /// Degrees-of-freedom corrected.
    HC1,
    /// Leverage corrected.
    HC2,
    /// Squared leverage correction.
    HC3,
}

/// Sandwich estimator with heteroskedasticity-consistent meat.
#[derive(Debug, Clone, Copy)]
pub struct HeteroskedasticCovariance {
    kind: HeteroskedasticKind,
}

impl HeteroskedasticCovariance {
    /// Create an estimator of the given kind.
    pub const fn new(kind: HeteroskedasticKind) -> Self {
        Self { kind }
    }

    /// The variant computed.
    pub const fn kind(&self) -> HeteroskedasticKind {
        self.kind
    }

    fn weights(&self, ctx: &FitContext<'_>) -> Result<Array1<f64>, CovarianceError> {
        let (n, _) = ctx.check()?;
        let squared = ctx.resid.mapv(|u| u * u);

        match self.kind {
            HeteroskedasticKind::HC0 => Ok(squared),
            HeteroskedasticKind::HC1 => {
                if ctx.df_resid == 0 {
                    return Err(CovarianceError::InsufficientData {
                        required: ctx.exog.ncols() + 1,
                        actual: n,
                    });
                }
                Ok(squared * (n as f64 / ctx.df_resid as f64))
            }
            HeteroskedasticKind::HC2 | HeteroskedasticKind::HC3 => {
                let power = if self.kind == HeteroskedasticKind::HC2 { 1 } else { 2 };
                let leverage = ctx.leverage();
                let mut weights = Array1::zeros(n);
                for (i, (&u2, &h)) in squared.iter().zip(leverage.iter()).enumerate() {
                    let one_minus_h = 1.0 - h;
                    if one_minus_h <= UNIT_LEVERAGE_TOLERANCE {
                        return Err(CovarianceError::UnitLeverage(i));
                    }
                    weights[i] = u2 / one_minus_h.powi(power);
                }
                Ok(weights)
            }
        }
    }
}

impl ParameterCovariance for HeteroskedasticCovariance {
    fn estimate(&self, ctx: &FitContext<'_>) -> Result<Array2<f64>, CovarianceError> {
        let weights = self.weights(ctx)?;
        let weighted = ctx.exog * &weights.view().insert_axis(Axis(1));
        let meat = ctx.exog.t().dot(&weighted);
        Ok(ctx.sandwich(&meat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::invert_spd;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn estimate(kind: HeteroskedasticKind, exog: &Array2<f64>, resid: &Array1<f64>) -> Array2<f64> {
        let xtx_inv = invert_spd(&exog.t().dot(exog)).unwrap();
        let ctx = FitContext {
            exog,
            resid,
            xtx_inv: &xtx_inv,
            df_resid: exog.nrows() - exog.ncols(),
        };
        HeteroskedasticCovariance::new(kind).estimate(&ctx).unwrap()
    }

    #[rstest]
    #[case(HeteroskedasticKind::HC0, 1.0)]
    #[case(HeteroskedasticKind::HC1, 4.0 / 3.0)]
    #[case(HeteroskedasticKind::HC2, 4.0 / 3.0)]
    #[case(HeteroskedasticKind::HC3, 16.0 / 9.0)]
    fn test_intercept_only(#[case] kind: HeteroskedasticKind, #[case] factor: f64) {
        // With only a constant, h_i = 1/n for every observation.
        let exog = Array2::ones((4, 1));
        let resid = array![1.0, -1.0, 2.0, -2.0];
        let cov = estimate(kind, &exog, &resid);
        let hc0 = 10.0 / 16.0;
        assert_relative_eq!(cov[[0, 0]], hc0 * factor, epsilon = 1e-12);
    }

    /// x = 0, 1, 2, 3, 10: the last point has leverage 294/314.
    fn unequal_leverage() -> (Array2<f64>, Array1<f64>) {
        let exog = array![
            [1.0, 0.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [1.0, 3.0],
            [1.0, 10.0]
        ];
        let resid = array![0.5, -0.3, 0.1, -0.4, 0.2];
        (exog, resid)
    }

    #[rstest]
    #[case::hc0(HeteroskedasticKind::HC0, [0.05032861373686559, -0.006400462493407441, 0.0012338228731388697])]
    #[case::hc1(HeteroskedasticKind::HC1, [0.08388102289477599, -0.0106674374890124, 0.0020563714552314497])]
    #[case::hc2(HeteroskedasticKind::HC2, [0.0870607010897632, -0.018782281938314997, 0.008541676523303208])]
    #[case::hc3(HeteroskedasticKind::HC3, [0.32179132587327497, -0.16993307872712826, 0.11741992370905789])]
    fn test_unequal_leverage_values(#[case] kind: HeteroskedasticKind, #[case] expected: [f64; 3]) {
        // (XᵀX)⁻¹ = [[57, -8], [-8, 2.5]] / 157, h_i = 1/5 + (x_i - 3.2)² / 62.8
        let (exog, resid) = unequal_leverage();
        let cov = estimate(kind, &exog, &resid);
        assert_relative_eq!(cov[[0, 0]], expected[0], max_relative = 1e-10);
        assert_relative_eq!(cov[[0, 1]], expected[1], max_relative = 1e-10);
        assert_relative_eq!(cov[[1, 0]], expected[1], max_relative = 1e-10);
        assert_relative_eq!(cov[[1, 1]], expected[2], max_relative = 1e-10);
    }

    #[test]
    fn test_ordering_of_variants() {
        let (exog, resid) = unequal_leverage();
        let hc0 = estimate(HeteroskedasticKind::HC0, &exog, &resid);
        let hc2 = estimate(HeteroskedasticKind::HC2, &exog, &resid);
        let hc3 = estimate(HeteroskedasticKind::HC3, &exog, &resid);
        for j in 0..2 {
            assert!(hc2[[j, j]] >= hc0[[j, j]]);
            assert!(hc3[[j, j]] >= hc2[[j, j]]);
        }
    }

    #[test]
    fn test_symmetric() {
        let exog = array![[1.0, 0.2], [1.0, -0.1], [1.0, 0.4], [1.0, 0.0]];
        let resid = array![0.01, -0.02, 0.03, -0.02];
        let cov = estimate(HeteroskedasticKind::HC3, &exog, &resid);
        assert_relative_eq!(cov[[0, 1]], cov[[1, 0]], epsilon = 1e-15);
    }

    #[test]
    fn test_unit_leverage() {
        // The last observation alone determines the dummy coefficient.
        let exog = array![[1.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        let resid = array![0.1, -0.1, 0.0];
        let xtx_inv = invert_spd(&exog.t().dot(&exog)).unwrap();
        let ctx = FitContext {
            exog: &exog,
            resid: &resid,
            xtx_inv: &xtx_inv,
            df_resid: 1,
        };
        let result = HeteroskedasticCovariance::new(HeteroskedasticKind::HC3).estimate(&ctx);
        assert!(matches!(result, Err(CovarianceError::UnitLeverage(2))));
    }
}
