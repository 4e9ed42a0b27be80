//! Month-end resampling of daily prices.

use crate::dates::{date_series, month_end, required_dates};
use crate::error::{DataError, Result};
use crate::french::DATE_COLUMN;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the monthly return column produced by [`monthly_returns`].
pub const STOCK_RETURN_COLUMN: &str = "stock_return";

const MONTH_END_COLUMN: &str = "month_end";

/// Which daily price the monthly return is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    /// Raw close.
    Close,
    /// Dividend- and split-adjusted close.
    #[default]
    AdjustedClose,
}

impl PriceField {
    /// Column name in a quotes frame.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::AdjustedClose => "adjusted_close",
        }
    }
}

/// Resample daily quotes to monthly returns.
///
/// Each trading day is keyed by the last calendar day of its month; the last
/// price observed in the month is that month's price, and the return is its
/// percentage change from the prior month. The first month's return is null.
///
/// # Returns
/// A DataFrame with columns: date (month-end), stock_return
pub fn monthly_returns(quotes: &DataFrame, field: PriceField) -> Result<DataFrame> {
    if quotes.height() == 0 {
        return Err(DataError::MissingData {
            symbol: symbol_of(quotes),
            reason: "no daily quotes to resample".to_string(),
        });
    }

    let dates = required_dates(quotes.column(DATE_COLUMN)?)?;
    let month_ends: Vec<_> = dates.iter().map(|d| month_end(*d)).collect();

    let price_col = field.column();
    let mut frame = quotes.select([DATE_COLUMN, price_col])?;
    let month_end_col: Column = date_series(MONTH_END_COLUMN, &month_ends)?.into();
    frame.with_column(month_end_col)?;

    let monthly = frame
        .lazy()
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .group_by_stable([col(MONTH_END_COLUMN)])
        .agg([col(price_col).drop_nulls().last().alias("price")])
        .sort([MONTH_END_COLUMN], SortMultipleOptions::default())
        .with_column(
            (col("price") / col("price").shift(lit(1)) - lit(1.0)).alias(STOCK_RETURN_COLUMN),
        )
        .select([
            col(MONTH_END_COLUMN).alias(DATE_COLUMN),
            col(STOCK_RETURN_COLUMN),
        ])
        .collect()?;

    Ok(monthly)
}

fn symbol_of(quotes: &DataFrame) -> String {
    quotes
        .column("symbol")
        .ok()
        .and_then(|c| c.str().ok().and_then(|s| s.get(0).map(str::to_string)))
        .unwrap_or_else(|| "unknown".to_string())
}
