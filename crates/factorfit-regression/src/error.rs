//! Error types for regression.

use crate::covariance::CovarianceError;
use thiserror::Error;

/// Result type for regression operations.
pub type Result<T> = std::result::Result<T, RegressionError>;

/// Errors that can occur while fitting a model.
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Fewer observations than parameters
    #[error("Insufficient data: need more than {required} observations, got {actual}")]
    InsufficientData {
        /// Number of parameters
        required: usize,
        /// Number of observations
        actual: usize,
    },

    /// Response and design disagree in length
    #[error("Dimension mismatch: expected {expected} rows, got {actual}")]
    DimensionMismatch {
        /// Rows in the response
        expected: usize,
        /// Rows in the design matrix
        actual: usize,
    },

    /// Regressor names do not match design columns
    #[error("Expected {expected} regressor names, got {actual}")]
    NameMismatch {
        /// Columns in the design matrix
        expected: usize,
        /// Names supplied
        actual: usize,
    },

    /// Data contains NaN or infinity
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Design matrix is rank deficient
    #[error("Singular design matrix: {0}")]
    Singular(String),

    /// Parameter covariance failure
    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    /// Invalid distribution parameters
    #[error("Distribution error: {0}")]
    Distribution(String),
}
