//! API module for the dispatch dashboard.
//!
//! Provides the REST interface over the shared dashboard service.

pub mod handlers;
pub mod service;

pub use service::DashboardService;
