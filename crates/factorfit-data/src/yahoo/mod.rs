//! Yahoo Finance data providers.

pub mod quotes;

pub use quotes::{QUOTE_COLUMNS, QuoteSource, RateLimiter, YahooQuoteProvider};
