#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod config;
pub mod error;
pub mod merge;
pub mod overview;
pub mod pipeline;

// Re-export main types from sub-crates
pub use factorfit_data as data;
pub use factorfit_output as output;
pub use factorfit_regression as regression;

pub use artifacts::{ArtifactPaths, write_artifacts};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use merge::{EXCESS_RETURN_COLUMN, MergedSample, merge_factor_returns};
pub use overview::SampleOverview;
pub use pipeline::{Pipeline, TickerAnalysis, analyze_ticker, collect_successes, quote_window};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
