//! End-to-end analysis: factors + quotes → merged sample → regression.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::merge::{EXCESS_RETURN_COLUMN, MergedSample, merge_factor_returns};
use crate::overview::SampleOverview;
use chrono::{Months, NaiveDate};
use factorfit_data::dates::month_start;
use factorfit_data::{FactorTable, PriceField, QuoteSource, load_factor_file, monthly_returns};
use factorfit_output::{
    CoefficientRecord, RegressionSummary, Report, ReportBuilder, SampleRecord,
};
use factorfit_regression::{CovarianceType, Ols, OlsResults};
use futures::stream::{self, StreamExt};
use polars::prelude::DataFrame;
use tracing::{info, warn};

/// Quote range covering every factor month.
///
/// Starts on the first day of the month before the first factor month, so
/// that month has a prior price to compute a return from, and ends on the
/// last factor month-end.
pub fn quote_window(factors: &FactorTable) -> (NaiveDate, NaiveDate) {
    let first = month_start(factors.first_date());
    let start = first.checked_sub_months(Months::new(1)).unwrap_or(first);
    (start, factors.last_date())
}

/// Regression of one ticker on the five factors.
#[derive(Debug, Clone)]
pub struct TickerAnalysis {
    /// Ticker symbol.
    pub symbol: String,
    /// Joined sample.
    pub sample: MergedSample,
    /// Fitted model.
    pub results: OlsResults,
    /// Summary table contents.
    pub summary: RegressionSummary,
    /// Descriptive statistics of the merged sample.
    pub overview: SampleOverview,
}

impl TickerAnalysis {
    /// Sample rows with fitted values and residuals.
    pub fn sample_records(&self) -> Vec<SampleRecord> {
        let s = &self.sample;
        s.dates
            .iter()
            .enumerate()
            .map(|(i, &date)| SampleRecord {
                date,
                mkt_rf: s.factors[[i, 0]],
                smb: s.factors[[i, 1]],
                hml: s.factors[[i, 2]],
                rmw: s.factors[[i, 3]],
                cma: s.factors[[i, 4]],
                rf: s.rf[i],
                stock_return: s.stock_return[i],
                excess_return: s.excess_return[i],
                fitted: self.results.fittedvalues[i],
                residual: self.results.resid[i],
            })
            .collect()
    }

    /// Coefficient rows tagged with the ticker.
    pub fn coefficient_records(&self) -> Vec<CoefficientRecord> {
        self.summary
            .coefficients
            .iter()
            .map(|c| CoefficientRecord::from_coefficient(&self.symbol, c))
            .collect()
    }

    /// JSON report of the analysis.
    pub fn report(&self) -> Result<Report> {
        let contents = serde_json::json!({
            "joined_rows": self.sample.joined_rows,
            "missing_after_join": self.sample.missing_after_join,
            "overview": self.overview,
        });
        Ok(ReportBuilder::new()
            .symbol(self.symbol.clone())
            .regression(self.summary.clone())
            .contents(contents)
            .build()?)
    }
}

/// Merge and regress one ticker's monthly returns.
pub fn analyze_ticker(
    symbol: &str,
    factors: &FactorTable,
    stock_returns: &DataFrame,
    cov_type: CovarianceType,
) -> Result<TickerAnalysis> {
    let sample = merge_factor_returns(symbol, factors, stock_returns)?;

    let results = Ols::new(
        sample.excess_return.clone(),
        sample.factors.clone(),
        sample.regressor_names(),
    )?
    .add_constant()
    .fit(cov_type)?;

    info!(
        %symbol,
        nobs = results.nobs,
        rsquared = results.rsquared,
        alpha = results.params[0],
        "regression fitted"
    );

    let summary =
        RegressionSummary::from_results(EXCESS_RETURN_COLUMN, &results, sample.date_range());
    let overview = SampleOverview::from_merged(&sample)?;

    Ok(TickerAnalysis {
        symbol: symbol.to_string(),
        sample,
        results,
        summary,
        overview,
    })
}

/// Runs the configured analysis against a quote source.
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    config: AnalysisConfig,
}

impl<S: QuoteSource> Pipeline<S> {
    /// Create a pipeline.
    pub const fn new(source: S, config: AnalysisConfig) -> Self {
        Self { source, config }
    }

    /// Run configuration.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the configured factor file.
    pub fn load_factors(&self) -> Result<FactorTable> {
        Ok(load_factor_file(&self.config.factor_path, &self.config.csv)?)
    }

    /// Fetch daily quotes and resample them to monthly returns.
    pub async fn fetch_returns(
        &self,
        symbol: &str,
        window: (NaiveDate, NaiveDate),
        field: PriceField,
    ) -> Result<DataFrame> {
        let quotes = self.source.fetch_quotes(symbol, window.0, window.1).await?;
        Ok(monthly_returns(&quotes, field)?)
    }

    /// Analyze every configured ticker, in configuration order.
    ///
    /// Quotes are fetched with bounded concurrency; regressions run one after
    /// another. Each ticker's outcome is reported separately.
    pub async fn run(&self, factors: &FactorTable) -> Vec<(String, Result<TickerAnalysis>)> {
        let window = quote_window(factors);
        info!(start = %window.0, end = %window.1, tickers = self.config.tickers.len(), "fetching quotes");

        let mut fetched: Vec<(usize, String, Result<DataFrame>)> =
            stream::iter(self.config.tickers.iter().cloned().enumerate())
                .map(|(idx, symbol)| async move {
                    let returns = self
                        .fetch_returns(&symbol, window, self.config.price_field)
                        .await;
                    (idx, symbol, returns)
                })
                .buffer_unordered(self.config.fetch_concurrency.max(1))
                .collect()
                .await;
        fetched.sort_by_key(|(idx, _, _)| *idx);

        fetched
            .into_iter()
            .map(|(_, symbol, returns)| {
                let outcome = returns.and_then(|r| {
                    analyze_ticker(&symbol, factors, &r, self.config.cov_type)
                });
                (symbol, outcome)
            })
            .collect()
    }
}

/// Keep the successful analyses, logging failures.
///
/// Fails only when nothing succeeded; a single failed ticker surfaces its own error.
pub fn collect_successes(
    outcomes: Vec<(String, Result<TickerAnalysis>)>,
) -> Result<Vec<TickerAnalysis>> {
    let total = outcomes.len();
    let mut successes = Vec::with_capacity(total);
    let mut last_error = None;

    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(analysis) => successes.push(analysis),
            Err(e) => {
                warn!(%symbol, error = %e, "ticker analysis failed");
                last_error = Some(e);
            }
        }
    }

    if successes.is_empty() {
        return Err(match last_error {
            Some(e) if total == 1 => e,
            _ => AnalysisError::NoSuccessfulTickers(total),
        });
    }
    Ok(successes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorfit_data::FactorRow;
    use factorfit_data::dates::month_end;

    fn table(first: (i32, u32), months: u32) -> FactorTable {
        let start = NaiveDate::from_ymd_opt(first.0, first.1, 1).unwrap();
        let rows = (0..months)
            .map(|m| FactorRow {
                date: month_end(start.checked_add_months(Months::new(m)).unwrap()),
                mkt_rf: Some(0.01),
                smb: Some(0.0),
                hml: Some(0.0),
                rmw: Some(0.0),
                cma: Some(0.0),
                rf: Some(0.0),
            })
            .collect();
        FactorTable::new(rows).unwrap()
    }

    #[test]
    fn test_quote_window() {
        let (start, end) = quote_window(&table((2020, 1), 12));
        assert_eq!(start, NaiveDate::from_ymd_opt(2019, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
    }

    #[test]
    fn test_collect_successes_single_failure_keeps_error() {
        let outcomes = vec![(
            "AAPL".to_string(),
            Err(AnalysisError::EmptySample {
                symbol: "AAPL".to_string(),
            }),
        )];
        assert!(matches!(
            collect_successes(outcomes),
            Err(AnalysisError::EmptySample { .. })
        ));
    }

    #[test]
    fn test_collect_successes_all_failed() {
        let outcomes = vec![
            ("A".to_string(), Err(AnalysisError::Config("x".into()))),
            ("B".to_string(), Err(AnalysisError::Config("y".into()))),
        ];
        assert!(matches!(
            collect_successes(outcomes),
            Err(AnalysisError::NoSuccessfulTickers(2))
        ));
    }
}
