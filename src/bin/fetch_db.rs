//! One-shot fetch of the remote dispatch database.
//!
//! No-op when the output file already exists (pass --force to re-download).

use anyhow::Result;
use clap::Parser;
use crates_box::config::{FetchOptions, DEFAULT_DB_PATH, DEFAULT_SOURCE_URL};
use crates_box::provision;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fetch_db")]
#[command(about = "Download the dispatch database if it is not present")]
struct Args {
    /// Remote URL of the database file
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    url: String,

    /// Local output path
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    output: PathBuf,

    /// Request timeout in seconds (0 disables the timeout)
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Accept non-2xx responses
    #[arg(long)]
    no_verify_status: bool,

    /// Re-download even if the file exists
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();

    if args.force && args.output.exists() {
        info!("Removing existing {}", args.output.display());
        std::fs::remove_file(&args.output)?;
    }

    let opts = FetchOptions {
        validate_status: !args.no_verify_status,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
    };

    let fetched = provision::ensure_local_copy(&args.output, &args.url, &opts).await?;
    if fetched {
        info!("Database written to {}", args.output.display());
    } else {
        info!(
            "Database already present at {}, nothing to do",
            args.output.display()
        );
    }

    Ok(())
}
