//! Filter-and-pivot report over the dispatch database.
//!
//! Run: ./target/release/report [OPTIONS]
//!
//! Options:
//!   --db PATH            Database path (default: dispatch.duckdb)
//!   --url URL            Fetch the database from URL when the file is absent
//!   --from DATE          Range start, YYYY-MM-DD (default: earliest in data)
//!   --to DATE            Range end, YYYY-MM-DD (default: latest in data)
//!   --supervisor NAME    Keep only these supervisors (repeatable)
//!   --crates-box VALUE   Keep only these crates/box values (repeatable)
//!   --round              Round ratios to the nearest integer
//!   --csv-dir DIR        Write pivot_table_*.csv and raw_data_*.csv here

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use crates_box::api::DashboardService;
use crates_box::config::{DashboardConfig, FetchOptions, DEFAULT_DB_PATH};
use crates_box::models::{PivotTable, Selection, Summary};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(about = "Crates/box pivot report over the dispatch database")]
struct Args {
    /// Database path
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Remote URL to fetch the database from when the local file is absent
    #[arg(long)]
    url: Option<String>,

    /// Start of the date range (defaults to the earliest date in the data)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date range (defaults to the latest date in the data)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Supervisor filter, repeatable (defaults to all)
    #[arg(long = "supervisor")]
    supervisors: Vec<String>,

    /// Crates-per-box filter, repeatable (defaults to all)
    #[arg(long = "crates-box")]
    crates_box: Vec<f64>,

    /// Round ratios to the nearest integer
    #[arg(long)]
    round: bool,

    /// Write both CSV artifacts into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(72));
    println!("  {}", title);
    println!("{}\n", "═".repeat(72));
}

fn print_summary(selection: &Selection, summary: &Summary) {
    print_section_header("SUMMARY METRICS");
    println!(
        "  Date Range:        {} .. {}  ({} days)",
        selection.start, selection.end, summary.days
    );
    println!("  Total Records:     {:>12}", summary.records);
    println!("  Total Crt_Box:     {:>12.2}", summary.total_ratio);
    println!("  Unique Routes:     {:>12}", summary.unique_routes);
    println!("  Supervisors:       {:>12}", selection.supervisors.len());
}

fn print_pivot(pivot: &PivotTable) {
    print_section_header("SUM OF CRT_BOX BY ROUTE AND DATE");

    print!("  {:<10}", "Route");
    for date in &pivot.dates {
        print!(" {:>11}", date.format("%Y-%m-%d"));
    }
    println!(" {:>11}", "Total");
    println!("  {}", "─".repeat(10 + 12 * (pivot.dates.len() + 1)));

    for row in &pivot.rows {
        print!("  {:<10}", row.route);
        for cell in &row.cells {
            print!(" {:>11.2}", cell);
        }
        println!(" {:>11.2}", row.total);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();

    let config = DashboardConfig {
        db_path: args.db,
        source_url: args.url,
        round_ratio: args.round,
        fetch: FetchOptions::default(),
    };
    let service = DashboardService::new(config);

    let supervisors = (!args.supervisors.is_empty()).then(|| args.supervisors.clone());
    let crates_box = (!args.crates_box.is_empty()).then(|| args.crates_box.clone());
    let selection = service
        .resolve_selection(args.from, args.to, supervisors, crates_box)
        .await?;

    let summary = service.summary(&selection).await?;
    print_summary(&selection, &summary);

    let pivot = service.pivot(&selection).await?;
    if pivot.is_empty() {
        println!("\n  No data available for the selected filters.");
    } else {
        print_pivot(&pivot);
    }

    if let Some(dir) = args.csv_dir {
        std::fs::create_dir_all(&dir)?;

        let (name, body) = service.pivot_csv(&selection).await?;
        let path = dir.join(&name);
        std::fs::write(&path, body)?;
        println!("\n  Wrote {}", path.display());

        let (name, body) = service.raw_csv(&selection).await?;
        let path = dir.join(&name);
        std::fs::write(&path, body)?;
        println!("  Wrote {}", path.display());
    }

    println!();
    Ok(())
}
