//! Error types for the analysis pipeline.

use factorfit_data::DataError;
use factorfit_output::{ExportError, ReportError};
use factorfit_regression::RegressionError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analyzing a ticker.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Loading factors or quotes failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Fitting the regression failed
    #[error(transparent)]
    Regression(#[from] RegressionError),

    /// DataFrame operation failed
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Writing an artifact failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Building or writing a report failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// No month survived the join
    #[error("No overlapping months with complete data for {symbol}")]
    EmptySample {
        /// Ticker symbol
        symbol: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Every requested ticker failed
    #[error("All {0} ticker(s) failed")]
    NoSuccessfulTickers(usize),
}
