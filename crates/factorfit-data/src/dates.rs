//! Calendar helpers shared by the factor loader, resampler and cache.
//!
//! Polars stores `Date` columns as `i32` days since the Unix epoch; the
//! conversions here go through that physical representation so callers
//! never depend on polars' temporal feature flags.

use crate::error::{DataError, Result};
use chrono::{Datelike, Months, NaiveDate};
use polars::prelude::*;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse a Fama-French `YYYYMM` stamp into that month's month-end date.
pub fn parse_yyyymm(stamp: &str) -> Option<NaiveDate> {
    let stamp = stamp.trim();
    if stamp.len() != 6 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = stamp[..4].parse().ok()?;
    let month: u32 = stamp[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(month_end)
}

/// Days since 1970-01-01, the physical value of a polars `Date`.
pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`to_epoch_days`].
pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Build a polars `Date` series from calendar dates.
pub fn date_series(name: &str, dates: &[NaiveDate]) -> PolarsResult<Series> {
    let days: Vec<i32> = dates.iter().map(|d| to_epoch_days(*d)).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// Read a `Date` column back into calendar dates, preserving nulls.
pub fn dates_from_column(column: &Column) -> Result<Vec<Option<NaiveDate>>> {
    let days = column.cast(&DataType::Int32)?;
    let days = days.i32()?;
    Ok(days
        .into_iter()
        .map(|d| d.and_then(from_epoch_days))
        .collect())
}

/// Read a `Date` column that must not contain nulls.
pub fn required_dates(column: &Column) -> Result<Vec<NaiveDate>> {
    dates_from_column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, d)| {
            d.ok_or_else(|| DataError::Parse {
                line: row + 1,
                reason: format!("null date in column '{}'", column.name()),
            })
        })
        .collect()
}
