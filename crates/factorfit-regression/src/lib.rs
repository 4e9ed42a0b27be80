#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod diagnostics;
pub mod error;
pub mod inference;
pub mod linalg;
pub mod ols;
pub mod stats;

// Re-export main types
pub use covariance::{CovarianceError, CovarianceType, ParameterCovariance};
pub use diagnostics::ResidualDiagnostics;
pub use error::{RegressionError, Result};
pub use inference::TestDistribution;
pub use ols::{Coefficient, Ols, OlsResults};
pub use stats::{Describe, gaussian_kde};
