//! CSV artifacts: the pivot table and the filtered raw rows.
//!
//! Filenames embed the selected date range, matching what the dashboard
//! offers for download.

use chrono::NaiveDate;

use crate::error::{DashboardError, Result};
use crate::models::{EnrichedSale, PivotTable};

pub fn pivot_filename(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "pivot_table_{}_{}.csv",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn raw_filename(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "raw_data_{}_{}.csv",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Pivot table as CSV: `Route`, one column per date, then `Total`.
pub fn pivot_csv(pivot: &PivotTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Route".to_string()];
    header.extend(pivot.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()));
    header.push("Total".to_string());
    writer.write_record(&header)?;

    for row in &pivot.rows {
        let mut record = vec![row.route.clone()];
        record.extend(row.cells.iter().map(|v| format!("{:.2}", v)));
        record.push(format!("{:.2}", row.total));
        writer.write_record(&record)?;
    }

    finish(writer)
}

/// Filtered raw rows as CSV, NULLs rendered as empty fields.
pub fn raw_csv(rows: &[EnrichedSale]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Sales_Date", "Route", "Crates_Box", "Crt_Box", "Supervisor"])?;

    for row in rows {
        writer.write_record([
            row.sales_date.format("%Y-%m-%d").to_string(),
            row.route.clone(),
            row.crates_box.map(|v| v.to_string()).unwrap_or_default(),
            row.ratio.map(|v| v.to_string()).unwrap_or_default(),
            row.supervisor.clone().unwrap_or_default(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
}
