//! Quote data fetching from Yahoo Finance.

use crate::dates::date_series;
use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use polars::prelude::*;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Columns of every quotes frame, in order.
pub const QUOTE_COLUMNS: [&str; 8] = [
    "symbol",
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "adjusted_close",
];

/// A source of daily OHLCV quotes.
///
/// Implementations return a frame with [`QUOTE_COLUMNS`], one row per
/// trading day between `start` and `end` inclusive.
pub trait QuoteSource {
    /// Fetch daily quotes for one symbol.
    fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<DataFrame>>;
}

/// Spaces out requests shared by concurrent callers.
///
/// Each [`wait`](Self::wait) returns no sooner than `delay` after the
/// previous one returned.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Allow one request per `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next free slot and claim it.
    pub async fn wait(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot {
            sleep_until(at).await;
        }
        *next_slot = Some(Instant::now() + self.delay);
    }
}

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    limiter: RateLimiter,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with default rate limiting (1 req/sec).
    pub fn try_new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a provider with custom rate limiting.
    ///
    /// The delay applies across all concurrent fetches through this provider.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            limiter: RateLimiter::new(rate_limit_delay),
        })
    }
}

impl QuoteSource for YahooQuoteProvider {
    /// Fetch OHLCV data for a single symbol.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, open, high, low, close, volume, adjusted_close
    async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        validate_request(symbol, start, end)?;

        let start_time = to_offset_datetime(start, NaiveTime::MIN)?;
        let end_time = to_offset_datetime(end, NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))?;

        self.limiter.wait().await;
        debug!(%symbol, %start, %end, "requesting quote history");
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let dates = quotes
            .iter()
            .map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| DataError::TimeConversion(format!("bad timestamp {}", q.timestamp)))
            })
            .collect::<Result<Vec<_>>>()?;

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec![symbol; quotes.len()]).into(),
            date_series("date", &dates)?.into(),
            Series::new("open".into(), quotes.iter().map(|q| q.open).collect::<Vec<f64>>()).into(),
            Series::new("high".into(), quotes.iter().map(|q| q.high).collect::<Vec<f64>>()).into(),
            Series::new("low".into(), quotes.iter().map(|q| q.low).collect::<Vec<f64>>()).into(),
            Series::new("close".into(), quotes.iter().map(|q| q.close).collect::<Vec<f64>>()).into(),
            Series::new("volume".into(), quotes.iter().map(|q| q.volume).collect::<Vec<u64>>()).into(),
            Series::new(
                "adjusted_close".into(),
                quotes.iter().map(|q| q.adjclose).collect::<Vec<f64>>(),
            )
            .into(),
        ])?;

        Ok(df)
    }
}

/// Reject empty symbols and inverted ranges before any request is made.
pub fn validate_request(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    Ok(())
}

fn to_offset_datetime(date: NaiveDate, at: NaiveTime) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(at).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}
