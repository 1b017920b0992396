//! REST API server for the Crates/Box dispatch dashboard.
//!
//! Usage:
//!   ./target/release/api_server [options]
//!
//! Options:
//!   --port PORT          Port to listen on (default: 8080)
//!   --db PATH            Path to the DuckDB file (default: dispatch.duckdb)
//!   --url URL            Fetch the database from URL when the file is absent
//!   --round              Round ratios to the nearest integer
//!   --fetch-timeout SECS Fetch timeout in seconds, 0 disables (default: 60)
//!   --no-verify-status   Accept non-2xx responses when downloading
//!
//! REST endpoints:
//!   GET  /api/v1/health            - Health check
//!   GET  /api/v1/domains           - Date bounds and filter domains
//!   GET  /api/v1/summary           - Headline metrics for a selection
//!   GET  /api/v1/pivot             - Route-by-date pivot for a selection
//!   GET  /api/v1/rows              - Filtered raw rows
//!   GET  /api/v1/export/pivot.csv  - Pivot table CSV download
//!   GET  /api/v1/export/raw.csv    - Raw rows CSV download
//!   POST /api/v1/refresh           - Drop the cached base table

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use crates_box::api::{handlers, DashboardService};
use crates_box::config::{DashboardConfig, FetchOptions, DEFAULT_DB_PATH};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "api_server")]
#[command(about = "REST API server for the crates/box dispatch dashboard")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Database path
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Remote URL to fetch the database from when the local file is absent
    #[arg(long)]
    url: Option<String>,

    /// Round ratios to the nearest integer
    #[arg(long)]
    round: bool,

    /// Fetch timeout in seconds (0 disables the timeout)
    #[arg(long, default_value = "60")]
    fetch_timeout: u64,

    /// Accept non-2xx responses when downloading the database
    #[arg(long)]
    no_verify_status: bool,
}

fn print_banner(port: u16) {
    println!("============================================================");
    println!("           CRATES/BOX DISPATCH DASHBOARD API");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  REST:     http://localhost:{}/api/v1/", port);
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/v1/health            Health check");
    println!("  GET  /api/v1/domains           Filter domains");
    println!("  GET  /api/v1/summary           Summary metrics");
    println!("  GET  /api/v1/pivot             Route-by-date pivot");
    println!("  GET  /api/v1/rows              Filtered raw rows");
    println!("  GET  /api/v1/export/pivot.csv  Pivot CSV");
    println!("  GET  /api/v1/export/raw.csv    Raw CSV");
    println!("  POST /api/v1/refresh           Drop cached table");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();

    let config = DashboardConfig {
        db_path: args.db,
        source_url: args.url,
        round_ratio: args.round,
        fetch: FetchOptions {
            validate_status: !args.no_verify_status,
            timeout: (args.fetch_timeout > 0).then(|| Duration::from_secs(args.fetch_timeout)),
        },
    };

    print_banner(args.port);

    let service = Arc::new(DashboardService::new(config));
    let app = create_router(service);

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(service: Arc<DashboardService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/domains", get(handlers::get_domains))
        .route("/api/v1/summary", get(handlers::get_summary))
        .route("/api/v1/pivot", get(handlers::get_pivot))
        .route("/api/v1/rows", get(handlers::get_rows))
        .route("/api/v1/export/pivot.csv", get(handlers::export_pivot))
        .route("/api/v1/export/raw.csv", get(handlers::export_raw))
        .route("/api/v1/refresh", post(handlers::refresh))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
