//! Per-ticker output files.

use crate::error::Result;
use crate::pipeline::TickerAnalysis;
use factorfit_output::{ExportError, ExportFormat, Exporter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written for one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Merged sample with fitted values and residuals (CSV).
    pub sample: PathBuf,
    /// Coefficient table (CSV).
    pub coefficients: PathBuf,
    /// Full report (JSON).
    pub report: PathBuf,
}

impl ArtifactPaths {
    /// Paths for `symbol` under `dir`.
    pub fn for_symbol(dir: &Path, symbol: &str) -> Self {
        Self {
            sample: dir.join(format!("{symbol}_sample.csv")),
            coefficients: dir.join(format!("{symbol}_coefficients.csv")),
            report: dir.join(format!("{symbol}_report.json")),
        }
    }
}

/// Write the sample, coefficients and report of one analysis into `dir`.
pub fn write_artifacts(analysis: &TickerAnalysis, dir: &Path) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(dir).map_err(ExportError::from)?;
    let paths = ArtifactPaths::for_symbol(dir, &analysis.symbol);

    analysis
        .sample_records()
        .export_to_file(&paths.sample, ExportFormat::Csv)?;
    analysis
        .coefficient_records()
        .export_to_file(&paths.coefficients, ExportFormat::Csv)?;
    analysis.report()?.write_to(&paths.report)?;

    info!(symbol = %analysis.symbol, dir = %dir.display(), "wrote artifacts");
    Ok(paths)
}
