//! Run configuration.

use crate::error::{AnalysisError, Result};
use factorfit_data::{FrenchCsvOptions, PriceField};
use factorfit_regression::CovarianceType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the Ken French 2x3 five-factor research file.
pub const DEFAULT_FACTOR_FILE: &str = "F-F_Research_Data_5_Factors_2x3.csv";

/// Ticker analyzed when none is given.
pub const DEFAULT_TICKER: &str = "AAPL";

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Path of the factor CSV.
    pub factor_path: PathBuf,

    /// Tickers to regress, each independently.
    pub tickers: Vec<String>,

    /// Factor CSV framing.
    pub csv: FrenchCsvOptions,

    /// Parameter covariance estimator.
    pub cov_type: CovarianceType,

    /// Daily price the monthly returns are computed from.
    pub price_field: PriceField,

    /// Maximum concurrent quote requests.
    pub fetch_concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            factor_path: PathBuf::from(DEFAULT_FACTOR_FILE),
            tickers: vec![DEFAULT_TICKER.to_string()],
            csv: FrenchCsvOptions::default(),
            cov_type: CovarianceType::default(),
            price_field: PriceField::default(),
            fetch_concurrency: 4,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration and normalize tickers to upper case without duplicates.
    pub fn validate(mut self) -> Result<Self> {
        let mut tickers: Vec<String> = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            let ticker = ticker.trim().to_uppercase();
            if ticker.is_empty() {
                return Err(AnalysisError::Config("empty ticker symbol".to_string()));
            }
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        if tickers.is_empty() {
            return Err(AnalysisError::Config("no tickers given".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(AnalysisError::Config(
                "fetch concurrency must be at least 1".to_string(),
            ));
        }
        self.tickers = tickers;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.tickers, vec!["AAPL"]);
        assert_eq!(config.cov_type, CovarianceType::HC3);
        assert_eq!(config.price_field, PriceField::AdjustedClose);
        assert_eq!(config.factor_path, PathBuf::from(DEFAULT_FACTOR_FILE));
    }

    #[test]
    fn test_validate_normalizes_tickers() {
        let config = AnalysisConfig {
            tickers: vec!["aapl".into(), " MSFT ".into(), "AAPL".into()],
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(config.tickers, vec!["AAPL", "MSFT"]);
    }

    #[rstest]
    #[case::no_tickers(vec![], 4)]
    #[case::blank_ticker(vec!["  "], 4)]
    #[case::zero_concurrency(vec!["AAPL"], 0)]
    fn test_validate_rejects_bad_input(#[case] tickers: Vec<&str>, #[case] concurrency: usize) {
        let config = AnalysisConfig {
            tickers: tickers.into_iter().map(String::from).collect(),
            fetch_concurrency: concurrency,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_serde_roundtrip_preserves_hac_lags() {
        let config = AnalysisConfig {
            cov_type: CovarianceType::Hac { max_lags: Some(6) },
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
