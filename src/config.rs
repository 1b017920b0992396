//! Runtime configuration for the dashboard pipeline.
//!
//! The two upstream dashboard variants diverged on minor behavior (one
//! rounded ratios, one skipped HTTP status validation, one fetched without a
//! timeout). Those differences are consolidated here as explicit options
//! instead of parallel code paths.

use std::path::PathBuf;
use std::time::Duration;

/// Direct download link for the pre-built dispatch database.
pub const DEFAULT_SOURCE_URL: &str =
    "https://drive.google.com/uc?export=download&id=1tYt3Z5McuQYifmNImZyACPHW9C9ju7L4";

/// Default local path for the dispatch database file.
pub const DEFAULT_DB_PATH: &str = "dispatch.duckdb";

/// Options for the one-shot remote fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Treat a non-2xx response as a fatal error instead of writing the body.
    pub validate_status: bool,
    /// Overall request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            validate_status: true,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Local path of the DuckDB file holding the three source relations.
    pub db_path: PathBuf,
    /// Remote URL to fetch the database from when the local file is absent.
    /// `None` requires the file to already exist.
    pub source_url: Option<String>,
    /// Round each sale's ratio to the nearest integer after loading.
    pub round_ratio: bool,
    pub fetch: FetchOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            source_url: None,
            round_ratio: false,
            fetch: FetchOptions::default(),
        }
    }
}
