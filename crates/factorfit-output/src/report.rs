//! JSON report for one regression run.

use crate::summary::RegressionSummary;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field was never set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// A report for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Symbol being analyzed.
    pub symbol: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// First month of the regression sample.
    pub sample_start: Option<NaiveDate>,

    /// Last month of the regression sample.
    pub sample_end: Option<NaiveDate>,

    /// Regression summary.
    pub regression: RegressionSummary,

    /// Additional contents (descriptive statistics, correlations).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report.
    pub fn new(symbol: String, regression: RegressionSummary, contents: serde_json::Value) -> Self {
        Self {
            symbol,
            timestamp: Utc::now(),
            sample_start: regression.sample_start,
            sample_end: regression.sample_end,
            regression,
            contents,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_to(&self, path: &std::path::Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    symbol: Option<String>,
    regression: Option<RegressionSummary>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol.
    pub fn symbol(mut self, symbol: String) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Set the regression summary.
    pub fn regression(mut self, regression: RegressionSummary) -> Self {
        self.regression = Some(regression);
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let symbol = self.symbol.ok_or(ReportError::MissingField("symbol"))?;
        let regression = self
            .regression
            .ok_or(ReportError::MissingField("regression"))?;
        Ok(Report::new(
            symbol,
            regression,
            self.contents.unwrap_or(serde_json::Value::Null),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorfit_regression::{CovarianceType, Ols};
    use ndarray::array;

    fn summary() -> RegressionSummary {
        let x = array![[0.01], [0.03], [-0.02], [0.04], [0.00], [-0.01]];
        let y = array![0.012, 0.035, -0.018, 0.041, 0.004, -0.013];
        let results = Ols::new(y, x, vec!["Mkt-RF".into()])
            .unwrap()
            .add_constant()
            .fit(CovarianceType::HC3)
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        RegressionSummary::from_results("excess_return", &results, Some((start, end)))
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .symbol("MSFT".to_string())
            .regression(summary())
            .contents(serde_json::json!({"key": "value"}))
            .build()
            .unwrap();

        assert_eq!(report.symbol, "MSFT");
        assert_eq!(report.sample_end, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn test_report_builder_requires_symbol() {
        let result = ReportBuilder::new().regression(summary()).build();
        assert!(matches!(result, Err(ReportError::MissingField("symbol"))));
    }

    #[test]
    fn test_report_json() {
        let report = Report::new("AAPL".to_string(), summary(), serde_json::Value::Null);
        let json = report.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["symbol"], "AAPL");
        assert_eq!(parsed["sample_start"], "2024-01-31");
        assert_eq!(parsed["regression"]["coefficients"][1]["name"], "Mkt-RF");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        Report::new("AAPL".to_string(), summary(), serde_json::Value::Null)
            .write_to(&path)
            .unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("\"AAPL\""));
    }
}
