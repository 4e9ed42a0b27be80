//! Descriptive overview of a set of columns.

use crate::error::Result;
use crate::merge::MergedSample;
use factorfit_data::{FACTOR_COLUMNS, FactorTable, REGRESSOR_COLUMNS, STOCK_RETURN_COLUMN};
use factorfit_output::{correlation_table, describe_table, missing_table};
use factorfit_regression::Describe;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-column statistics, correlations and missing counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOverview {
    /// Column names.
    pub names: Vec<String>,
    /// Descriptive statistics per column.
    pub describe: Vec<Describe>,
    /// Pearson correlations, row-major.
    pub correlation: Vec<Vec<f64>>,
    /// Missing values per column.
    pub missing: Vec<usize>,
}

const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "q25", "median", "q75", "max"];

fn describe_exprs(idx: usize, name: &str) -> Vec<Expr> {
    let quartile = |q: f64| col(name).quantile(lit(q), QuantileMethod::Linear);
    [
        col(name).count(),
        col(name).mean(),
        col(name).std(1),
        col(name).min(),
        quartile(0.25),
        quartile(0.5),
        quartile(0.75),
        col(name).max(),
    ]
    .into_iter()
    .zip(STATISTICS)
    .map(|(expr, stat)| expr.cast(DataType::Float64).alias(format!("{idx}_{stat}")))
    .collect()
}

/// Correlation over rows where both columns are present.
fn correlation_expr(i: usize, a: &str, j: usize, b: &str) -> Expr {
    let both = col(a).is_not_null().and(col(b).is_not_null());
    pearson_corr(col(a).filter(both.clone()), col(b).filter(both))
        .cast(DataType::Float64)
        .alias(format!("corr_{i}_{j}"))
}

fn scalar(stats: &DataFrame, name: &str) -> Result<f64> {
    Ok(stats.column(name)?.f64()?.get(0).unwrap_or(f64::NAN))
}

impl SampleOverview {
    /// Summarize the named columns of a frame; nulls count as missing.
    pub fn from_frame(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let mut exprs: Vec<Expr> = Vec::new();
        for (i, name) in columns.iter().enumerate() {
            exprs.extend(describe_exprs(i, name));
            for (j, other) in columns.iter().enumerate().skip(i) {
                exprs.push(correlation_expr(i, name, j, other));
            }
        }
        let stats = df.clone().lazy().select(exprs).collect()?;

        let k = columns.len();
        let mut describe = Vec::with_capacity(k);
        let mut correlation = vec![vec![f64::NAN; k]; k];
        let mut missing = Vec::with_capacity(k);
        for (i, name) in columns.iter().enumerate() {
            let stat = |s: &str| scalar(&stats, &format!("{i}_{s}"));
            describe.push(Describe {
                count: stat("count")? as usize,
                mean: stat("mean")?,
                std: stat("std")?,
                min: stat("min")?,
                q25: stat("q25")?,
                median: stat("median")?,
                q75: stat("q75")?,
                max: stat("max")?,
            });
            for j in i..k {
                let r = scalar(&stats, &format!("corr_{i}_{j}"))?;
                correlation[i][j] = r;
                correlation[j][i] = r;
            }
            missing.push(df.column(name)?.null_count());
        }

        Ok(Self {
            names: columns.iter().map(|s| s.to_string()).collect(),
            describe,
            correlation,
            missing,
        })
    }

    /// The six columns of the factor file.
    pub fn from_factor_table(table: &FactorTable) -> Result<Self> {
        Self::from_frame(&table.to_dataframe()?, &FACTOR_COLUMNS)
    }

    /// Factors, risk-free rate and stock return of a merged sample.
    pub fn from_merged(sample: &MergedSample) -> Result<Self> {
        let mut columns: Vec<&str> = REGRESSOR_COLUMNS.to_vec();
        columns.extend(["RF", STOCK_RETURN_COLUMN]);
        Self::from_frame(&sample.frame, &columns)
    }

    /// Describe table, one column per variable.
    pub fn describe_table(&self) -> String {
        let entries: Vec<(String, Describe)> = self
            .names
            .iter()
            .cloned()
            .zip(self.describe.iter().copied())
            .collect();
        describe_table(&entries)
    }

    /// Correlation matrix table.
    pub fn correlation_table(&self) -> String {
        let k = self.names.len();
        let matrix = ndarray::Array2::from_shape_fn((k, k), |(i, j)| self.correlation[i][j]);
        correlation_table(&self.names, &matrix)
    }

    /// Missing-value table.
    pub fn missing_table(&self) -> String {
        let entries: Vec<(String, usize)> = self
            .names
            .iter()
            .cloned()
            .zip(self.missing.iter().copied())
            .collect();
        missing_table(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use factorfit_data::FactorRow;

    fn table() -> FactorTable {
        let rows = (1..=4)
            .map(|m| {
                let date = NaiveDate::from_ymd_opt(2023, m + 1, 1).unwrap().pred_opt().unwrap();
                let x = m as f64 / 100.0;
                FactorRow {
                    date,
                    mkt_rf: Some(x),
                    smb: Some(-x),
                    hml: if m == 2 { None } else { Some(x * 2.0) },
                    rmw: Some(0.001 * m as f64),
                    cma: Some(0.0),
                    rf: Some(0.003),
                }
            })
            .collect();
        FactorTable::new(rows).unwrap()
    }

    #[test]
    fn test_factor_overview() {
        let overview = SampleOverview::from_factor_table(&table()).unwrap();
        assert_eq!(overview.names, FACTOR_COLUMNS.map(String::from).to_vec());
        assert_eq!(overview.missing, vec![0, 0, 1, 0, 0, 0]);
        assert_eq!(overview.describe[2].count, 3);
        assert_relative_eq!(overview.describe[0].mean, 0.025, epsilon = 1e-15);
        assert_relative_eq!(overview.correlation[0][1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(overview.correlation[1][0], overview.correlation[0][1]);
        assert_relative_eq!(overview.correlation[0][0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_describe_matches_hand_values() {
        // Mkt-RF is 0.01, 0.02, 0.03, 0.04
        let d = SampleOverview::from_factor_table(&table()).unwrap().describe[0];
        assert_eq!(d.count, 4);
        assert_relative_eq!(d.std, (5.0f64 / 3.0).sqrt() / 100.0, epsilon = 1e-12);
        assert_relative_eq!(d.min, 0.01);
        assert_relative_eq!(d.q25, 0.0175, epsilon = 1e-12);
        assert_relative_eq!(d.median, 0.025, epsilon = 1e-12);
        assert_relative_eq!(d.q75, 0.0325, epsilon = 1e-12);
        assert_relative_eq!(d.max, 0.04);
    }

    #[test]
    fn test_correlation_skips_missing_pairs() {
        // HML is 2 × Mkt-RF wherever it is present
        let overview = SampleOverview::from_factor_table(&table()).unwrap();
        assert_relative_eq!(overview.correlation[0][2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tables_render() {
        let overview = SampleOverview::from_factor_table(&table()).unwrap();
        assert!(overview.describe_table().contains("Mkt-RF"));
        assert!(overview.correlation_table().contains("RF"));
        assert!(overview.missing_table().contains("HML"));
    }
}
