//! Quote cache location.
//!
//! The SQLite quote cache lives in a platform-specific cache directory:
//! - Linux: `~/.cache/factorfit/`
//! - macOS: `~/Library/Caches/factorfit/`
//! - Windows: `%LOCALAPPDATA%\factorfit\`

use factorfit_data::{DataError, SqliteCache};
use std::path::PathBuf;

/// Get the default cache directory path.
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factorfit")
}

/// Get the cache database path.
pub(crate) fn cache_path() -> PathBuf {
    default_cache_dir().join("quotes.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let path = cache_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    SqliteCache::new(&path)
}

/// One-line description of the cache for the console header.
pub(crate) fn describe_cache(cache: &SqliteCache) -> String {
    let location = cache_path();
    match cache.get_stats() {
        Ok(stats) => format!(
            "{} ({} quotes for {} symbols)",
            location.display(),
            stats.total_quotes,
            stats.unique_symbols
        ),
        Err(_) => location.display().to_string(),
    }
}
