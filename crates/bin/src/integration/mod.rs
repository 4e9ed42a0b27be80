//! Glue between the CLI and the factorfit crates: quote cache location and
//! console rendering.

pub(crate) mod cache_manager;
pub(crate) mod console;
