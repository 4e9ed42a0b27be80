//! Caching layer for market data.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache};

use crate::error::Result;
use crate::yahoo::QuoteSource;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{debug, warn};

/// A [`QuoteSource`] that reads through a SQLite cache.
///
/// Cache failures never fail a fetch; they are logged and the inner source
/// is used instead.
#[derive(Debug)]
pub struct CachedQuoteSource<S> {
    inner: S,
    cache: Option<SqliteCache>,
    force_refresh: bool,
}

impl<S: QuoteSource> CachedQuoteSource<S> {
    /// Wrap `inner`. With `cache = None` every request goes to `inner`.
    pub const fn new(inner: S, cache: Option<SqliteCache>, force_refresh: bool) -> Self {
        Self {
            inner,
            cache,
            force_refresh,
        }
    }

    /// The cache, if one is attached.
    pub const fn cache(&self) -> Option<&SqliteCache> {
        self.cache.as_ref()
    }

    fn cached(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Option<DataFrame> {
        let cache = self.cache.as_ref()?;
        if self.force_refresh {
            return None;
        }
        match cache.has_quotes(symbol, start, end) {
            Ok(true) => match cache.get_quotes(symbol, start, end) {
                Ok(df) => Some(df),
                Err(e) => {
                    warn!(%symbol, error = %e, "failed to read cached quotes");
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                warn!(%symbol, error = %e, "failed to query quote cache");
                None
            }
        }
    }
}

impl<S: QuoteSource> QuoteSource for CachedQuoteSource<S> {
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        if let Some(df) = self.cached(symbol, start, end) {
            debug!(%symbol, rows = df.height(), "quotes served from cache");
            return Ok(df);
        }

        let df = self.inner.fetch_quotes(symbol, start, end).await?;

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put_quotes(&df)
        {
            warn!(%symbol, error = %e, "failed to cache quotes");
        }

        Ok(df)
    }
}
