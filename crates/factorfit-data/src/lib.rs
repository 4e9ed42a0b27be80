#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factorfit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod dates;
pub mod error;
pub mod french;
pub mod monthly;
pub mod yahoo;

pub use cache::{CacheStats, CachedQuoteSource, SqliteCache};
pub use error::{DataError, Result};
pub use french::{
    DATE_COLUMN, FACTOR_COLUMNS, FactorRow, FactorTable, FrenchCsvOptions, REGRESSOR_COLUMNS,
    load_factor_file,
};
pub use monthly::{PriceField, STOCK_RETURN_COLUMN, monthly_returns};
pub use yahoo::{QuoteSource, RateLimiter, YahooQuoteProvider};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
