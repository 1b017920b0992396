use anyhow::Result;
use crates_box::config::DEFAULT_DB_PATH;
use crates_box::{pipeline, store};
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let conn = store::open(Path::new(&db_path))?;

    info!("Connected to {}", db_path);

    info!("=== Database Statistics ===");

    for (relation, count) in store::relation_counts(&conn)? {
        info!("{}: {} rows", relation, count);
    }

    let rows = pipeline::coerce_dates(store::load_enriched(&conn)?);
    info!("Enriched sales: {} rows", rows.len());

    if let Some(domains) = pipeline::domains(&rows) {
        info!("Date span: {} .. {}", domains.min_date, domains.max_date);
        info!("Supervisors: {:?}", domains.supervisors);
        info!("Crates/box values: {:?}", domains.crates_box);

        let selection = pipeline::default_selection(&domains);
        let filtered = pipeline::apply_filters(&rows, &selection)?;
        let pivot = pipeline::pivot(&filtered);

        info!("=== Top 5 Routes by Total Crt_Box ===");
        for row in pivot.rows.iter().take(5) {
            info!("{}: {:.2}", row.route, row.total);
        }
    } else {
        info!("No usable rows after date coercion");
    }

    Ok(())
}
