//! Crates/Box dispatch reporting.
//!
//! Fetches a pre-built DuckDB file, enriches the sales facts with the
//! product and supervisor dimensions, and pivots the derived crates-per-box
//! ratio by route and date, with CSV export.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod provision;
pub mod seed;
pub mod store;

pub use error::{DashboardError, Result};
