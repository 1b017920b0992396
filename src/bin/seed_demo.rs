//! Demo database generator.
//!
//! Writes a DuckDB file with the three source relations (sales, products,
//! supervisors) so the dashboard can be exercised without the remote file.
//!
//! Run: ./target/release/seed_demo -- [OPTIONS]

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use crates_box::config::DEFAULT_DB_PATH;
use crates_box::seed::{self, SeedSpec};
use duckdb::Connection;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "seed_demo")]
#[command(about = "Generate a demo dispatch database with the three source relations")]
struct Args {
    /// Output path
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    output: PathBuf,

    /// Number of sales rows
    #[arg(long, default_value = "500")]
    rows: usize,

    /// Number of routes
    #[arg(long, default_value = "8")]
    routes: usize,

    /// Day span of the generated dates
    #[arg(long, default_value = "30")]
    days: i64,

    /// First sale date
    #[arg(long, default_value = "2024-01-01")]
    start_date: NaiveDate,

    /// Random seed for reproducibility
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();

    if args.output.exists() {
        anyhow::bail!("{} already exists, refusing to overwrite", args.output.display());
    }

    let conn = Connection::open(&args.output)?;
    let spec = SeedSpec {
        rows: args.rows,
        routes: args.routes,
        days: args.days,
        start_date: args.start_date,
        seed: args.seed,
    };
    let stats = seed::seed(&conn, &spec)?;

    info!(
        "Seeded {}: {} sales, {} products, {} supervisor mappings",
        args.output.display(),
        stats.sales,
        stats.products,
        stats.supervisors
    );

    Ok(())
}
