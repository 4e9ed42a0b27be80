//! Loader for Kenneth French's five-factor research file.
//!
//! The CSV distributed as `F-F_Research_Data_5_Factors_2x3.csv` has a short
//! text preamble, a monthly block keyed by `YYYYMM`, then an annual block and
//! a copyright footer:
//!
//! ```text
//! This file was created by CMPT_ME_BEME_OP_INV_RETS using the 202401 CRSP database.
//! The 1-month TBill rate data until 202405 are from Ibbotson Associates.
//!
//! ,Mkt-RF,SMB,HML,RMW,CMA,RF
//! 196307,  -0.39,  -0.41,  -0.97,   0.68,  -1.18,   0.27
//! ...
//!
//!  Annual Factors: January-December
//! ,Mkt-RF,SMB,HML,RMW,CMA,RF
//!   1964,  ...
//! ```
//!
//! Only the monthly block is read. Values are published in percent and are
//! stored as decimal fractions.

use crate::dates::{date_series, parse_yyyymm};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Factor columns in file order: five factors followed by the risk-free rate.
pub const FACTOR_COLUMNS: [&str; 6] = ["Mkt-RF", "SMB", "HML", "RMW", "CMA", "RF"];

/// The five regressors (everything but `RF`).
pub const REGRESSOR_COLUMNS: [&str; 5] = ["Mkt-RF", "SMB", "HML", "RMW", "CMA"];

/// Name of the month-end date column in every frame this crate produces.
pub const DATE_COLUMN: &str = "date";

/// Values at or below this are Ken French's missing-data sentinels (-99.99, -999).
const MISSING_SENTINEL: f64 = -99.99;

/// Framing options for the factor CSV.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrenchCsvOptions {
    /// Lines to skip before the header row. `None` locates the header by name.
    pub skip_rows: Option<usize>,
    /// Lines to drop from the end of the file. `None` stops at the end of the
    /// monthly block.
    pub skip_footer: Option<usize>,
}

impl FrenchCsvOptions {
    /// Reproduce the fixed framing of the 2x3 five-factor file (3 header
    /// lines, 65 footer lines).
    pub const fn fixed(skip_rows: usize, skip_footer: usize) -> Self {
        Self {
            skip_rows: Some(skip_rows),
            skip_footer: Some(skip_footer),
        }
    }
}

/// One month of factor returns, as decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    /// Month-end date.
    pub date: NaiveDate,
    /// Market excess return.
    pub mkt_rf: Option<f64>,
    /// Small minus big.
    pub smb: Option<f64>,
    /// High minus low (value).
    pub hml: Option<f64>,
    /// Robust minus weak (profitability).
    pub rmw: Option<f64>,
    /// Conservative minus aggressive (investment).
    pub cma: Option<f64>,
    /// One-month T-bill rate.
    pub rf: Option<f64>,
}

impl FactorRow {
    /// Values in [`FACTOR_COLUMNS`] order.
    pub const fn values(&self) -> [Option<f64>; 6] {
        [self.mkt_rf, self.smb, self.hml, self.rmw, self.cma, self.rf]
    }
}

/// Monthly factor table keyed by unique, ascending month-end dates.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    rows: Vec<FactorRow>,
}

impl FactorTable {
    /// Build a table, enforcing unique ascending dates.
    pub fn new(rows: Vec<FactorRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(DataError::MissingData {
                symbol: "factors".to_string(),
                reason: "factor file contains no monthly rows".to_string(),
            });
        }
        for pair in rows.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DataError::UnorderedDates {
                    previous: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }
        Ok(Self { rows })
    }

    /// All rows.
    pub fn rows(&self) -> &[FactorRow] {
        &self.rows
    }

    /// Number of months.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First month-end in the table.
    pub fn first_date(&self) -> NaiveDate {
        self.rows[0].date
    }

    /// Last month-end in the table.
    pub fn last_date(&self) -> NaiveDate {
        self.rows[self.rows.len() - 1].date
    }

    /// Values of one factor column by name.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = FACTOR_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|r| r.values()[idx]).collect())
    }

    /// Missing-value count per factor column.
    pub fn missing_counts(&self) -> Vec<(&'static str, usize)> {
        FACTOR_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let missing = self
                    .rows
                    .iter()
                    .filter(|r| r.values()[idx].is_none())
                    .count();
                (*name, missing)
            })
            .collect()
    }

    /// Convert to a polars frame with a `date` column and one column per factor.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        let mut columns: Vec<Column> = vec![date_series(DATE_COLUMN, &dates)?.into()];
        for (idx, name) in FACTOR_COLUMNS.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.values()[idx]).collect();
            columns.push(Series::new((*name).into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Load the monthly block of a Fama-French five-factor CSV.
///
/// # Errors
/// [`DataError::FileNotFound`] when `path` does not exist; parse errors name
/// the offending line.
pub fn load_factor_file(path: impl AsRef<Path>, options: &FrenchCsvOptions) -> Result<FactorTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let table = parse_factor_csv(&text, options)?;
    info!(
        path = %path.display(),
        months = table.len(),
        first = %table.first_date(),
        last = %table.last_date(),
        "Data loaded successfully"
    );
    Ok(table)
}

/// Parse factor CSV text. See [`load_factor_file`].
pub fn parse_factor_csv(text: &str, options: &FrenchCsvOptions) -> Result<FactorTable> {
    let lines: Vec<&str> = text.lines().collect();

    let header_idx = match options.skip_rows {
        Some(n) => n,
        None => lines
            .iter()
            .position(|line| line.split(',').any(|cell| cell.trim() == FACTOR_COLUMNS[0]))
            .ok_or_else(|| DataError::MissingColumn(FACTOR_COLUMNS[0].to_string()))?,
    };
    if header_idx >= lines.len() {
        return Err(DataError::Parse {
            line: header_idx + 1,
            reason: "header row is past the end of the file".to_string(),
        });
    }

    let body_end = match options.skip_footer {
        Some(n) => lines.len().saturating_sub(n).max(header_idx + 1),
        None => {
            let block_len = lines[header_idx + 1..]
                .iter()
                .take_while(|line| {
                    line.split(',')
                        .next()
                        .is_some_and(|cell| parse_yyyymm(cell).is_some())
                })
                .count();
            header_idx + 1 + block_len
        }
    };
    debug!(header_line = header_idx + 1, body_end, "framed monthly block");

    let block = lines[header_idx..body_end].join("\n");
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(block.as_bytes());

    let headers = reader.headers()?.clone();
    let mut positions = [0usize; 6];
    for (slot, name) in positions.iter_mut().zip(FACTOR_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = header_idx + record.position().map_or(0, |p| p.line() as usize);
        let stamp = record.get(0).unwrap_or_default();
        if stamp.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let date = parse_yyyymm(stamp).ok_or_else(|| DataError::Parse {
            line,
            reason: format!("expected YYYYMM date, found '{}'", stamp),
        })?;

        let mut values = [None; 6];
        for (value, &pos) in values.iter_mut().zip(&positions) {
            *value = parse_percent(record.get(pos).unwrap_or_default(), line)?;
        }
        rows.push(FactorRow {
            date,
            mkt_rf: values[0],
            smb: values[1],
            hml: values[2],
            rmw: values[3],
            cma: values[4],
            rf: values[5],
        });
    }

    FactorTable::new(rows)
}

/// Parse one percent cell into a decimal; blanks, `NA` and sentinels are missing.
fn parse_percent(cell: &str, line: usize) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| DataError::Parse {
        line,
        reason: format!("non-numeric factor value '{}'", cell),
    })?;
    if value <= MISSING_SENTINEL {
        return Ok(None);
    }
    Ok(Some(value / 100.0))
}
