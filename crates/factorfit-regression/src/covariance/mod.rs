//! Parameter covariance estimation
//!
//! Given a fitted least-squares model, these estimators produce the
//! covariance matrix of the coefficient estimates. All of them except the
//! classical estimator are sandwich forms
//!
//! ```text
//! V = (XᵀX)⁻¹ · M · (XᵀX)⁻¹
//! ```
//!
//! and differ only in the "meat" `M`.

pub mod classical;
pub mod heteroskedastic;
pub mod newey_west;

pub use classical::ClassicalCovariance;
pub use heteroskedastic::{HeteroskedasticCovariance, HeteroskedasticKind};
pub use newey_west::{NeweyWestConfig, NeweyWestEstimator};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// An observation fully determines its own fitted value
    #[error("Observation {0} has leverage 1; HC2/HC3 are undefined")]
    UnitLeverage(usize),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// What an estimator needs from a fitted model.
#[derive(Debug, Clone, Copy)]
pub struct FitContext<'a> {
    /// Design matrix (n × k), including the constant column if any.
    pub exog: &'a Array2<f64>,
    /// Residuals (n).
    pub resid: &'a Array1<f64>,
    /// `(XᵀX)⁻¹` (k × k).
    pub xtx_inv: &'a Array2<f64>,
    /// Residual degrees of freedom `n − k`.
    pub df_resid: usize,
}

impl FitContext<'_> {
    fn check(&self) -> Result<(usize, usize), CovarianceError> {
        let (n, k) = self.exog.dim();
        if self.resid.len() != n {
            return Err(CovarianceError::DimensionMismatch {
                expected: n,
                actual: self.resid.len(),
            });
        }
        if self.xtx_inv.dim() != (k, k) {
            return Err(CovarianceError::DimensionMismatch {
                expected: k,
                actual: self.xtx_inv.nrows(),
            });
        }
        Ok((n, k))
    }

    /// `(XᵀX)⁻¹ · meat · (XᵀX)⁻¹`
    fn sandwich(&self, meat: &Array2<f64>) -> Array2<f64> {
        self.xtx_inv.dot(meat).dot(self.xtx_inv)
    }

    /// Hat-matrix diagonal `h_i = x_iᵀ (XᵀX)⁻¹ x_i`.
    pub fn leverage(&self) -> Array1<f64> {
        self.exog
            .rows()
            .into_iter()
            .map(|row| row.dot(&self.xtx_inv.dot(&row)))
            .collect()
    }
}

/// Trait for parameter covariance estimators
pub trait ParameterCovariance {
    /// Estimate the k × k covariance of the coefficient vector.
    fn estimate(&self, ctx: &FitContext<'_>) -> Result<Array2<f64>, CovarianceError>;

    /// Whether inference should use the normal rather than Student-t distribution.
    fn is_robust(&self) -> bool {
        true
    }
}

/// Covariance choice for a fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceType {
    /// `σ² (XᵀX)⁻¹`
    NonRobust,
    /// White's estimator.
    HC0,
    /// HC0 scaled by `n / (n − k)`.
    HC1,
    /// Leverage-adjusted, `u² / (1 − h)`.
    HC2,
    /// Jackknife-like, `u² / (1 − h)²`.
    #[default]
    HC3,
    /// Newey-West with Bartlett weights; `None` picks the lag count from the sample size.
    Hac {
        /// Maximum lag.
        max_lags: Option<usize>,
    },
}

impl CovarianceType {
    /// Build the estimator for this covariance type.
    pub fn estimator(&self) -> Box<dyn ParameterCovariance> {
        match *self {
            Self::NonRobust => Box::new(ClassicalCovariance),
            Self::HC0 => Box::new(HeteroskedasticCovariance::new(HeteroskedasticKind::HC0)),
            Self::HC1 => Box::new(HeteroskedasticCovariance::new(HeteroskedasticKind::HC1)),
            Self::HC2 => Box::new(HeteroskedasticCovariance::new(HeteroskedasticKind::HC2)),
            Self::HC3 => Box::new(HeteroskedasticCovariance::new(HeteroskedasticKind::HC3)),
            Self::Hac { max_lags } => Box::new(NeweyWestEstimator::new(NeweyWestConfig {
                lags: max_lags,
            })),
        }
    }
}

impl fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonRobust => write!(f, "nonrobust"),
            Self::HC0 => write!(f, "HC0"),
            Self::HC1 => write!(f, "HC1"),
            Self::HC2 => write!(f, "HC2"),
            Self::HC3 => write!(f, "HC3"),
            Self::Hac { max_lags: Some(l) } => write!(f, "HAC({})", l),
            Self::Hac { max_lags: None } => write!(f, "HAC"),
        }
    }
}
