//! SQLite caching layer for daily quotes.

use crate::dates::{date_series, required_dates};
use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, params};
use std::path::Path;

/// Share of calendar days that must be cached before a range counts as present.
/// Exchanges trade on roughly 252 of 365 days.
const MIN_CALENDAR_COVERAGE: f64 = 0.6;

/// Days a cached range may fall short of either end of the request, covering
/// weekends and holiday runs.
const EDGE_TOLERANCE_DAYS: i64 = 7;

/// SQLite cache for market data.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                adjusted_close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        Ok(())
    }

    /// Check if quotes are cached for a symbol and date range.
    ///
    /// The cached rows must reach both ends of the range (the end clamped to
    /// today) within a few days, and cover enough of the days in between.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let (count, first, last): (i64, Option<String>, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(date), MAX(date) FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let (Some(first), Some(last)) = (first, last) else {
            return Ok(false);
        };
        let parse = |date: &str| {
            date.parse::<NaiveDate>().map_err(|e| DataError::Parse {
                line: 0,
                reason: format!("cached date '{}': {}", date, e),
            })
        };
        let (first, last) = (parse(&first)?, parse(&last)?);

        let end = end.min(Utc::now().date_naive());
        if (first - start).num_days() > EDGE_TOLERANCE_DAYS
            || (end - last).num_days() > EDGE_TOLERANCE_DAYS
        {
            return Ok(false);
        }

        let days = (end - start).num_days() + 1;
        let expected_count = (days as f64 * MIN_CALENDAR_COVERAGE) as i64;

        Ok(count > 0 && count >= expected_count)
    }

    /// Get cached quotes for a symbol and date range.
    pub fn get_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, date, open, high, low, close, volume, adjusted_close
             FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut opens = Vec::new();
        let mut highs = Vec::new();
        let mut lows = Vec::new();
        let mut closes = Vec::new();
        let mut volumes = Vec::new();
        let mut adj_closes = Vec::new();

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        for (line, row) in rows.enumerate() {
            let (sym, date, open, high, low, close, volume, adj_close) = row?;
            let date = date.parse::<NaiveDate>().map_err(|e| DataError::Parse {
                line: line + 1,
                reason: format!("cached date '{}': {}", date, e),
            })?;
            symbols.push(sym);
            dates.push(date);
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            volumes.push(volume as u64);
            adj_closes.push(adj_close);
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            date_series("date", &dates)?.into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        Ok(df)
    }

    /// Store quotes in the cache.
    pub fn put_quotes(&self, df: &DataFrame) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let symbols = df.column("symbol")?.str()?;
        let dates = required_dates(df.column("date")?)?;
        let opens = df.column("open")?.f64()?;
        let highs = df.column("high")?.f64()?;
        let lows = df.column("low")?.f64()?;
        let closes = df.column("close")?.f64()?;
        let volumes = df.column("volume")?.cast(&DataType::Int64)?;
        let volumes = volumes.i64()?;
        let adj_closes = df.column("adjusted_close")?.f64()?;

        let missing = |line: usize, field: &str| DataError::Parse {
            line: line + 1,
            reason: format!("Missing {}", field),
        };

        let tx = self.conn.unchecked_transaction()?;

        for (i, date) in dates.iter().enumerate() {
            let symbol = symbols.get(i).ok_or_else(|| missing(i, "symbol"))?;
            let open = opens.get(i).ok_or_else(|| missing(i, "open"))?;
            let high = highs.get(i).ok_or_else(|| missing(i, "high"))?;
            let low = lows.get(i).ok_or_else(|| missing(i, "low"))?;
            let close = closes.get(i).ok_or_else(|| missing(i, "close"))?;
            let volume = volumes.get(i).ok_or_else(|| missing(i, "volume"))?;
            let adj_close = adj_closes
                .get(i)
                .ok_or_else(|| missing(i, "adjusted_close"))?;

            tx.execute(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, adjusted_close, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    symbol,
                    date.to_string(),
                    open,
                    high,
                    low,
                    close,
                    volume,
                    adj_close,
                    cached_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let quotes_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;

        let symbols_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM quotes", [], |row| {
                    row.get(0)
                })?;

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols
    pub unique_symbols: usize,
}
