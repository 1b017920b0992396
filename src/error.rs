//! Error taxonomy for the dashboard pipeline.
//!
//! Fetch and query failures are fatal to the render cycle that hit them;
//! `InvalidDateRange` only rejects the offending selection. An empty filter
//! result is not an error and has no variant here.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("download failed with HTTP status {status}")]
    FetchStatus { status: u16 },

    #[error("download failed: {0}")]
    FetchTransport(#[from] reqwest::Error),

    #[error("source database not found at {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("relation '{0}' missing from the source database")]
    MissingRelation(String),

    #[error("column '{column}' missing from relation '{relation}'")]
    MissingColumn { relation: String, column: String },

    #[error("query failed: {0}")]
    Query(#[from] duckdb::Error),

    #[error("no rows loaded from the source database")]
    EmptySource,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export failed: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
