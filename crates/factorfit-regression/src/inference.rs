//! Reference distributions for coefficient tests.
//!
//! Classical covariance uses Student-t with the residual degrees of freedom;
//! robust covariance estimators use the standard normal.

use crate::error::{RegressionError, Result};
use crate::linalg::invert_spd;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Distribution of the per-coefficient test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TestDistribution {
    /// Student-t with `df` degrees of freedom.
    StudentT {
        /// Degrees of freedom
        df: f64,
    },
    /// Standard normal.
    Normal,
}

fn distribution_error(err: impl std::fmt::Display) -> RegressionError {
    RegressionError::Distribution(err.to_string())
}

impl TestDistribution {
    /// Pick the distribution for a fit.
    pub fn for_fit(robust: bool, df_resid: usize) -> Self {
        if robust {
            Self::Normal
        } else {
            Self::StudentT {
                df: df_resid as f64,
            }
        }
    }

    /// Column label used in coefficient tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StudentT { .. } => "t",
            Self::Normal => "z",
        }
    }

    fn survival(&self, x: f64) -> Result<f64> {
        match *self {
            Self::StudentT { df } => Ok(StudentsT::new(0.0, 1.0, df)
                .map_err(distribution_error)?
                .sf(x)),
            Self::Normal => Ok(Normal::new(0.0, 1.0).map_err(distribution_error)?.sf(x)),
        }
    }

    /// Two-sided p-value `2 · P(T > |stat|)`.
    pub fn two_sided_pvalue(&self, stat: f64) -> Result<f64> {
        if stat.is_nan() {
            return Ok(f64::NAN);
        }
        Ok((2.0 * self.survival(stat.abs())?).min(1.0))
    }

    /// Upper `1 − alpha/2` quantile for a two-sided interval.
    pub fn critical_value(&self, alpha: f64) -> Result<f64> {
        if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(RegressionError::Distribution(format!(
                "alpha must be in (0, 1), got {}",
                alpha
            )));
        }
        let p = 1.0 - alpha / 2.0;
        match *self {
            Self::StudentT { df } => Ok(StudentsT::new(0.0, 1.0, df)
                .map_err(distribution_error)?
                .inverse_cdf(p)),
            Self::Normal => Ok(Normal::new(0.0, 1.0)
                .map_err(distribution_error)?
                .inverse_cdf(p)),
        }
    }
}

/// Upper tail of a chi-squared distribution.
pub fn chi_squared_sf(stat: f64, df: f64) -> Result<f64> {
    if stat.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(ChiSquared::new(df).map_err(distribution_error)?.sf(stat))
}

/// Joint Wald test that the coefficients at `indices` are all zero.
///
/// Returns the F statistic `βᵣᵀ Vᵣᵣ⁻¹ βᵣ / q` and its p-value under
/// `F(q, df_resid)`.
pub fn wald_f_test(
    params: &Array1<f64>,
    cov: &Array2<f64>,
    indices: &[usize],
    df_resid: usize,
) -> Result<(f64, f64)> {
    let q = indices.len();
    if q == 0 || df_resid == 0 {
        return Ok((f64::NAN, f64::NAN));
    }

    let beta = Array1::from_iter(indices.iter().map(|&i| params[i]));
    let mut sub = Array2::<f64>::zeros((q, q));
    for (a, &i) in indices.iter().enumerate() {
        for (b, &j) in indices.iter().enumerate() {
            sub[[a, b]] = cov[[i, j]];
        }
    }

    // A perfect fit leaves nothing to test against.
    if sub.diag().iter().any(|&v| v <= 0.0) {
        return Ok((f64::NAN, f64::NAN));
    }

    let sub_inv = invert_spd(&sub)?;
    let fvalue = beta.dot(&sub_inv.dot(&beta)) / q as f64;
    let pvalue = FisherSnedecor::new(q as f64, df_resid as f64)
        .map_err(distribution_error)?
        .sf(fvalue);
    Ok((fvalue, pvalue))
}
