//! Join factor returns with a stock's monthly returns.

use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use factorfit_data::dates::required_dates;
use factorfit_data::{DATE_COLUMN, FactorTable, REGRESSOR_COLUMNS, STOCK_RETURN_COLUMN};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::{debug, info};

/// Stock return minus the risk-free rate.
pub const EXCESS_RETURN_COLUMN: &str = "excess_return";

const RF_COLUMN: &str = "RF";
const PREVIEW_ROWS: usize = 5;

/// Months present in both inputs with no missing values, as dense arrays.
#[derive(Debug, Clone)]
pub struct MergedSample {
    /// Ticker symbol.
    pub symbol: String,
    /// Month-end dates, ascending.
    pub dates: Vec<NaiveDate>,
    /// Factor returns (n × 5) in `REGRESSOR_COLUMNS` order.
    pub factors: Array2<f64>,
    /// Risk-free rate.
    pub rf: Array1<f64>,
    /// Raw monthly stock return.
    pub stock_return: Array1<f64>,
    /// `stock_return − rf`.
    pub excess_return: Array1<f64>,
    /// Missing values per column right after the join.
    pub missing_after_join: Vec<(String, usize)>,
    /// Rows produced by the join before incomplete rows were dropped.
    pub joined_rows: usize,
    /// First rows of the joined frame before dropping.
    pub preview: DataFrame,
    /// Clean frame: date, factors, RF, stock_return, excess_return.
    pub frame: DataFrame,
}

impl MergedSample {
    /// Number of months.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when no month survived.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rows × columns of the clean frame.
    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    /// First and last month.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// Regressor names in column order of [`Self::factors`].
    pub fn regressor_names(&self) -> Vec<String> {
        REGRESSOR_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    /// One factor column by position.
    pub fn factor(&self, j: usize) -> Vec<f64> {
        self.factors.column(j).to_vec()
    }

    /// Factors, risk-free rate and stock return, by name.
    pub fn named_columns(&self) -> Vec<(String, Vec<f64>)> {
        let mut columns: Vec<(String, Vec<f64>)> = self
            .regressor_names()
            .into_iter()
            .enumerate()
            .map(|(j, name)| (name, self.factor(j)))
            .collect();
        columns.push((RF_COLUMN.to_string(), self.rf.to_vec()));
        columns.push((STOCK_RETURN_COLUMN.to_string(), self.stock_return.to_vec()));
        columns
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Inner-join factors and monthly stock returns on `date` and drop incomplete rows.
///
/// `stock_returns` must have the `date` and `stock_return` columns produced by
/// [`factorfit_data::monthly_returns`].
pub fn merge_factor_returns(
    symbol: &str,
    factors: &FactorTable,
    stock_returns: &DataFrame,
) -> Result<MergedSample> {
    let factor_df = factors.to_dataframe()?;
    let returns = stock_returns.select([DATE_COLUMN, STOCK_RETURN_COLUMN])?;

    let joined = factor_df
        .lazy()
        .join(
            returns.lazy(),
            [col(DATE_COLUMN)],
            [col(DATE_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let missing_after_join: Vec<(String, usize)> = joined
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != DATE_COLUMN)
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect();
    let joined_rows = joined.height();
    debug!(%symbol, joined_rows, "joined factors with stock returns");

    let frame = joined
        .drop_nulls::<String>(None)?
        .lazy()
        .with_column((col(STOCK_RETURN_COLUMN) - col(RF_COLUMN)).alias(EXCESS_RETURN_COLUMN))
        .collect()?;

    if frame.height() == 0 {
        return Err(AnalysisError::EmptySample {
            symbol: symbol.to_string(),
        });
    }

    let dates = required_dates(frame.column(DATE_COLUMN)?)?;
    let n = dates.len();
    let mut factor_matrix = Array2::<f64>::zeros((n, REGRESSOR_COLUMNS.len()));
    for (j, name) in REGRESSOR_COLUMNS.iter().enumerate() {
        for (i, v) in float_column(&frame, name)?.into_iter().enumerate() {
            factor_matrix[[i, j]] = v;
        }
    }

    info!(
        %symbol,
        months = n,
        dropped = joined_rows - n,
        "merged factor and stock returns"
    );

    Ok(MergedSample {
        symbol: symbol.to_string(),
        dates,
        factors: factor_matrix,
        rf: Array1::from(float_column(&frame, RF_COLUMN)?),
        stock_return: Array1::from(float_column(&frame, STOCK_RETURN_COLUMN)?),
        excess_return: Array1::from(float_column(&frame, EXCESS_RETURN_COLUMN)?),
        missing_after_join,
        joined_rows,
        preview: joined.head(Some(PREVIEW_ROWS)),
        frame,
    })
}
