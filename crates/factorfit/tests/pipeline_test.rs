//! End-to-end pipeline runs against an in-memory quote source.

use approx::assert_abs_diff_eq;
use chrono::{Datelike, Months, NaiveDate};
use factorfit::data::dates::{date_series, month_end};
use factorfit::data::{DataError, FactorRow, FactorTable, QuoteSource};
use factorfit::regression::CovarianceType;
use factorfit::{AnalysisConfig, AnalysisError, Pipeline, collect_successes, write_artifacts};
use polars::prelude::*;

const MONTHS: u32 = 48;
const ALPHA: f64 = 0.002;
const BETAS: [f64; 5] = [1.2, 0.3, -0.4, 0.1, 0.0];

fn first_month() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
}

fn factor_value(t: u32, j: usize) -> f64 {
    ((t as usize * (2 * j + 1)) as f64 * 0.37 + j as f64).sin() * 0.03
}

fn factor_table() -> FactorTable {
    let rows = (0..MONTHS)
        .map(|t| FactorRow {
            date: month_end(first_month().checked_add_months(Months::new(t)).unwrap()),
            mkt_rf: Some(factor_value(t, 0)),
            smb: Some(factor_value(t, 1)),
            hml: Some(factor_value(t, 2)),
            rmw: Some(factor_value(t, 3)),
            cma: Some(factor_value(t, 4)),
            rf: Some(0.001 + 0.0001 * (t % 3) as f64),
        })
        .collect();
    FactorTable::new(rows).unwrap()
}

/// Prices whose month-end returns follow the five-factor model exactly,
/// up to a small deterministic disturbance.
struct FixtureQuotes {
    factors: FactorTable,
}

impl FixtureQuotes {
    fn monthly_return(&self, t: usize) -> f64 {
        let row = &self.factors.rows()[t];
        let values = row.values();
        let systematic: f64 = BETAS
            .iter()
            .zip(values.iter())
            .map(|(b, v)| b * v.unwrap())
            .sum();
        row.rf.unwrap() + ALPHA + systematic + (t as f64 * 1.7).cos() * 0.0005
    }
}

impl QuoteSource for FixtureQuotes {
    async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> factorfit::data::Result<DataFrame> {
        if symbol == "FAIL" {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "no quotes".to_string(),
            });
        }

        let mut dates = Vec::new();
        let mut prices = Vec::new();
        let mut price = 100.0;
        let mut month = start;
        let mut t = 0;
        while month <= end {
            if month > start {
                price *= 1.0 + self.monthly_return(t);
                t += 1;
            }
            // Mid-month quote is superseded by the month-end quote
            dates.push(month.with_day(14).unwrap());
            prices.push(price * 0.97);
            dates.push(month_end(month) - chrono::Duration::days(1));
            prices.push(price);
            month = month.checked_add_months(Months::new(1)).unwrap();
        }

        let n = dates.len();
        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec![symbol; n]).into(),
            date_series("date", &dates).unwrap().into(),
            Series::new("open".into(), prices.clone()).into(),
            Series::new("high".into(), prices.clone()).into(),
            Series::new("low".into(), prices.clone()).into(),
            Series::new("close".into(), prices.clone()).into(),
            Series::new("volume".into(), vec![1_000u64; n]).into(),
            Series::new("adjusted_close".into(), prices).into(),
        ])?;
        Ok(df)
    }
}

fn pipeline(tickers: &[&str]) -> Pipeline<FixtureQuotes> {
    let config = AnalysisConfig {
        tickers: tickers.iter().map(|s| s.to_string()).collect(),
        fetch_concurrency: 2,
        ..Default::default()
    }
    .validate()
    .unwrap();
    Pipeline::new(
        FixtureQuotes {
            factors: factor_table(),
        },
        config,
    )
}

#[tokio::test]
async fn test_pipeline_recovers_factor_loadings() {
    let factors = factor_table();
    let outcomes = pipeline(&["aapl"]).run(&factors).await;
    assert_eq!(outcomes.len(), 1);

    let analyses = collect_successes(outcomes).unwrap();
    let analysis = &analyses[0];
    assert_eq!(analysis.symbol, "AAPL");
    assert_eq!(analysis.results.nobs, MONTHS as usize);
    assert_eq!(analysis.results.cov_type, CovarianceType::HC3);

    assert_abs_diff_eq!(analysis.results.params[0], ALPHA, epsilon = 1e-3);
    for (j, beta) in BETAS.iter().enumerate() {
        assert_abs_diff_eq!(analysis.results.params[j + 1], *beta, epsilon = 0.05);
    }
    assert!(analysis.results.rsquared > 0.95);

    let summary = analysis.summary.to_ascii_table();
    assert!(summary.contains("excess_return"));
    assert!(summary.contains("Mkt-RF"));
}

#[tokio::test]
async fn test_failed_ticker_does_not_abort_run() {
    let factors = factor_table();
    let outcomes = pipeline(&["MSFT", "FAIL", "AAPL"]).run(&factors).await;

    let symbols: Vec<&str> = outcomes.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(symbols, vec!["MSFT", "FAIL", "AAPL"]);
    assert!(matches!(outcomes[1].1, Err(AnalysisError::Data(_))));

    let analyses = collect_successes(outcomes).unwrap();
    assert_eq!(analyses.len(), 2);
}

#[tokio::test]
async fn test_artifacts_written() {
    let factors = factor_table();
    let analyses = collect_successes(pipeline(&["AAPL"]).run(&factors).await).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let paths = write_artifacts(&analyses[0], dir.path()).unwrap();

    let sample = std::fs::read_to_string(&paths.sample).unwrap();
    // Header plus one line per month
    assert_eq!(sample.lines().count(), MONTHS as usize + 1);
    assert!(sample.lines().next().unwrap().contains("Mkt-RF"));

    let coefficients = std::fs::read_to_string(&paths.coefficients).unwrap();
    assert_eq!(coefficients.lines().count(), 7);
    assert!(coefficients.contains("const"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.report).unwrap()).unwrap();
    assert_eq!(report["symbol"], "AAPL");
    assert_eq!(report["contents"]["joined_rows"], MONTHS as u64);
}
