//! Export functionality for regression artifacts.
//!
//! CSV and JSON writers for the merged sample (with fitted values and
//! residuals) and for the coefficient table.

use chrono::NaiveDate;
use factorfit_regression::Coefficient;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One month of the regression sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleRecord {
    /// Month-end date.
    pub date: NaiveDate,

    /// Market excess return.
    #[serde(rename = "Mkt-RF")]
    pub mkt_rf: f64,

    /// Size factor.
    #[serde(rename = "SMB")]
    pub smb: f64,

    /// Value factor.
    #[serde(rename = "HML")]
    pub hml: f64,

    /// Profitability factor.
    #[serde(rename = "RMW")]
    pub rmw: f64,

    /// Investment factor.
    #[serde(rename = "CMA")]
    pub cma: f64,

    /// Risk-free rate.
    #[serde(rename = "RF")]
    pub rf: f64,

    /// Raw stock return.
    pub stock_return: f64,

    /// Stock return minus the risk-free rate.
    pub excess_return: f64,

    /// Fitted excess return.
    pub fitted: f64,

    /// Regression residual.
    pub residual: f64,
}

/// One coefficient, tagged with the ticker it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoefficientRecord {
    /// Ticker symbol.
    pub symbol: String,

    /// Regressor name.
    pub name: String,

    /// Point estimate.
    pub coef: f64,

    /// Standard error.
    pub std_err: f64,

    /// Test statistic.
    pub statistic: f64,

    /// Two-sided p-value.
    pub pvalue: f64,

    /// Lower 95% bound.
    pub ci_lower: f64,

    /// Upper 95% bound.
    pub ci_upper: f64,
}

impl CoefficientRecord {
    /// Tag a coefficient with its ticker.
    pub fn from_coefficient(symbol: &str, coefficient: &Coefficient) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: coefficient.name.clone(),
            coef: coefficient.coef,
            std_err: coefficient.std_err,
            statistic: coefficient.statistic,
            pvalue: coefficient.pvalue,
            ci_lower: coefficient.ci_lower,
            ci_upper: coefficient.ci_upper,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn export_records<T: Serialize>(records: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => records_to_csv(records),
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

impl Exporter for Vec<SampleRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for Vec<CoefficientRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SampleRecord {
        SampleRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            mkt_rf: 0.0071,
            smb: -0.0574,
            hml: -0.0238,
            rmw: 0.0068,
            cma: -0.0096,
            rf: 0.0047,
            stock_return: -0.0422,
            excess_return: -0.0469,
            fitted: -0.01,
            residual: -0.0369,
        }
    }

    fn coefficient() -> CoefficientRecord {
        CoefficientRecord::from_coefficient(
            "AAPL",
            &Coefficient {
                name: "Mkt-RF".to_string(),
                coef: 1.21,
                std_err: 0.08,
                statistic: 15.125,
                pvalue: 0.0,
                ci_lower: 1.05,
                ci_upper: 1.37,
            },
        )
    }

    #[test]
    fn test_sample_csv_header_uses_factor_names() {
        let csv = vec![sample()].export_to_string(ExportFormat::Csv).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "date,Mkt-RF,SMB,HML,RMW,CMA,RF,stock_return,excess_return,fitted,residual"
        );
        assert!(csv.contains("2024-01-31"));
        assert!(csv.contains("-0.0369"));
    }

    #[test]
    fn test_coefficient_export_json() {
        let json = vec![coefficient()]
            .export_to_string(ExportFormat::Json)
            .unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"AAPL\""));
        assert!(json.contains("\"Mkt-RF\""));
        assert!(json.contains("1.21"));
    }

    #[test]
    fn test_pretty_json() {
        let json = vec![coefficient()]
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");

        vec![sample(), sample()]
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
