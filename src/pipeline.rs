//! In-memory transform pipeline over the enriched sales table.
//!
//! Runs after the enrichment query, in order: date coercion, optional ratio
//! rounding, filter-domain computation, conjunctive filtering, and the
//! route-by-date pivot with row totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::{
    EnrichedSale, FilterDomains, PivotRow, PivotTable, RawSaleRow, Selection, Summary,
};
use crate::store;

/// Load, verify, query and coerce the base table from the configured source.
pub fn materialize(config: &DashboardConfig) -> Result<Vec<EnrichedSale>> {
    let conn = store::open(&config.db_path)?;
    let raw = store::load_enriched(&conn)?;
    let mut rows = coerce_dates(raw);
    if config.round_ratio {
        round_ratios(&mut rows);
    }
    Ok(rows)
}

/// Coerce the date column; rows that fail coercion (or carry no route) are
/// dropped, never fatal.
pub fn coerce_dates(raw: Vec<RawSaleRow>) -> Vec<EnrichedSale> {
    let total = raw.len();
    let mut rows = Vec::with_capacity(total);
    for r in raw {
        let date = r.sales_date.as_deref().and_then(parse_sale_date);
        if let (Some(sales_date), Some(route)) = (date, r.route) {
            rows.push(EnrichedSale {
                sales_date,
                route,
                crates_box: r.crates_box,
                ratio: r.ratio,
                supervisor: r.supervisor,
            });
        }
    }
    let dropped = total - rows.len();
    if dropped > 0 {
        warn!("Dropped {} rows with an invalid date or missing route", dropped);
    }
    rows
}

fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Round every ratio to the nearest integer, in place.
pub fn round_ratios(rows: &mut [EnrichedSale]) {
    for row in rows.iter_mut() {
        if let Some(ratio) = row.ratio.as_mut() {
            *ratio = ratio.round();
        }
    }
}

/// Filter domains present in the base table, or `None` when it is empty.
pub fn domains(rows: &[EnrichedSale]) -> Option<FilterDomains> {
    let min_date = rows.iter().map(|r| r.sales_date).min()?;
    let max_date = rows.iter().map(|r| r.sales_date).max()?;

    let supervisors: Vec<String> = rows
        .iter()
        .filter_map(|r| r.supervisor.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut crates_box: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.crates_box)
        .filter(|v| !v.is_nan())
        .collect();
    crates_box.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    crates_box.dedup();

    Some(FilterDomains {
        min_date,
        max_date,
        supervisors,
        crates_box,
    })
}

/// "Everything selected" over the given domains.
pub fn default_selection(domains: &FilterDomains) -> Selection {
    Selection {
        start: domains.min_date,
        end: domains.max_date,
        supervisors: domains.supervisors.clone(),
        crates_box: domains.crates_box.clone(),
    }
}

/// Apply the conjunctive filters.
///
/// An inverted date range is rejected before any filtering. An empty
/// selected set yields an empty result, not "no filter". Rows with a NULL
/// supervisor or NULL crates-per-box never match a set filter.
pub fn apply_filters(rows: &[EnrichedSale], selection: &Selection) -> Result<Vec<EnrichedSale>> {
    if selection.start > selection.end {
        return Err(DashboardError::InvalidDateRange {
            start: selection.start,
            end: selection.end,
        });
    }
    if selection.supervisors.is_empty() || selection.crates_box.is_empty() {
        return Ok(Vec::new());
    }
    Ok(rows
        .iter()
        .filter(|r| {
            r.sales_date >= selection.start
                && r.sales_date <= selection.end
                && r.supervisor
                    .as_deref()
                    .map_or(false, |s| selection.supervisors.iter().any(|sel| sel == s))
                && r.crates_box
                    .map_or(false, |v| selection.crates_box.iter().any(|sel| *sel == v))
        })
        .cloned()
        .collect())
}

/// Group by (date, route) with a null-safe ratio sum, reshape to a
/// route-by-date matrix with zero-filled cells, append the row total, and
/// sort by total descending (route ascending as the tie-break).
pub fn pivot(rows: &[EnrichedSale]) -> PivotTable {
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut sums: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for row in rows {
        dates.insert(row.sales_date);
        *sums
            .entry(row.route.clone())
            .or_default()
            .entry(row.sales_date)
            .or_insert(0.0) += row.ratio.unwrap_or(0.0);
    }

    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let mut out: Vec<PivotRow> = sums
        .into_iter()
        .map(|(route, by_date)| {
            let cells: Vec<f64> = dates
                .iter()
                .map(|d| by_date.get(d).copied().unwrap_or(0.0))
                .collect();
            let total = cells.iter().sum();
            PivotRow { route, cells, total }
        })
        .collect();
    out.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.route.cmp(&b.route))
    });

    PivotTable { dates, rows: out }
}

/// Headline metrics over the filtered rows.
pub fn summary(rows: &[EnrichedSale], selection: &Selection) -> Summary {
    let total_ratio = rows.iter().filter_map(|r| r.ratio).sum();
    let unique_routes = rows
        .iter()
        .map(|r| r.route.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let days = (selection.end - selection.start).num_days() + 1;
    Summary {
        records: rows.len(),
        total_ratio,
        unique_routes,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sale(
        date: &str,
        route: &str,
        crates_box: Option<f64>,
        ratio: Option<f64>,
        supervisor: Option<&str>,
    ) -> EnrichedSale {
        EnrichedSale {
            sales_date: d(date),
            route: route.to_string(),
            crates_box,
            ratio,
            supervisor: supervisor.map(str::to_string),
        }
    }

    fn select_all(rows: &[EnrichedSale]) -> Selection {
        default_selection(&domains(rows).unwrap())
    }

    #[test]
    fn coercion_drops_invalid_dates_only() {
        let raw = vec![
            RawSaleRow {
                sales_date: Some("2024-01-01".to_string()),
                route: Some("A".to_string()),
                crates_box: Some(12.0),
                ratio: Some(2.0),
                supervisor: Some("X".to_string()),
            },
            RawSaleRow {
                sales_date: Some("not-a-date".to_string()),
                route: Some("A".to_string()),
                crates_box: Some(12.0),
                ratio: Some(2.0),
                supervisor: Some("X".to_string()),
            },
            RawSaleRow {
                sales_date: None,
                route: Some("A".to_string()),
                crates_box: None,
                ratio: None,
                supervisor: None,
            },
        ];
        let rows = coerce_dates(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sales_date, d("2024-01-01"));
    }

    #[test]
    fn coercion_accepts_timestamp_strings() {
        assert_eq!(parse_sale_date("2024-01-05 00:00:00"), Some(d("2024-01-05")));
        assert_eq!(
            parse_sale_date("2024-01-05 13:30:01.250"),
            Some(d("2024-01-05"))
        );
        assert_eq!(parse_sale_date(" 2024-01-05 "), Some(d("2024-01-05")));
        assert_eq!(parse_sale_date("05/01/2024"), None);
    }

    #[test]
    fn filtered_dates_stay_within_the_inclusive_range() {
        let rows = vec![
            sale("2024-01-01", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-02", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-03", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-04", "A", Some(12.0), Some(1.0), Some("X")),
        ];
        let mut selection = select_all(&rows);
        selection.start = d("2024-01-02");
        selection.end = d("2024-01-03");
        let filtered = apply_filters(&rows, &selection).unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .iter()
            .all(|r| r.sales_date >= selection.start && r.sales_date <= selection.end));
    }

    #[test]
    fn inverted_range_is_a_validation_error() {
        let rows = vec![sale("2024-01-01", "A", Some(12.0), Some(1.0), Some("X"))];
        let mut selection = select_all(&rows);
        selection.start = d("2024-01-02");
        selection.end = d("2024-01-01");
        let err = apply_filters(&rows, &selection).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidDateRange { .. }));
    }

    #[test]
    fn empty_selected_set_yields_empty_result() {
        let rows = vec![sale("2024-01-01", "A", Some(12.0), Some(1.0), Some("X"))];

        let mut selection = select_all(&rows);
        selection.supervisors.clear();
        assert!(apply_filters(&rows, &selection).unwrap().is_empty());

        let mut selection = select_all(&rows);
        selection.crates_box.clear();
        assert!(apply_filters(&rows, &selection).unwrap().is_empty());
    }

    #[test]
    fn null_dimension_rows_never_match_set_filters() {
        let rows = vec![
            sale("2024-01-01", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-01", "A", Some(12.0), Some(1.0), None),
            sale("2024-01-01", "A", None, None, Some("X")),
        ];
        let selection = select_all(&rows);
        let filtered = apply_filters(&rows, &selection).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn domains_are_sorted_and_deduplicated() {
        let rows = vec![
            sale("2024-01-03", "B", Some(24.0), Some(1.0), Some("Y")),
            sale("2024-01-01", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-02", "A", Some(12.0), Some(1.0), Some("X")),
            sale("2024-01-02", "C", None, None, None),
        ];
        let domains = domains(&rows).unwrap();
        assert_eq!(domains.min_date, d("2024-01-01"));
        assert_eq!(domains.max_date, d("2024-01-03"));
        assert_eq!(domains.supervisors, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(domains.crates_box, vec![12.0, 24.0]);
    }

    #[test]
    fn domains_of_empty_table_are_none() {
        assert!(domains(&[]).is_none());
    }

    #[test]
    fn pivot_totals_reconcile_with_date_columns() {
        let rows = vec![
            sale("2024-01-01", "A", Some(12.0), Some(2.0), Some("X")),
            sale("2024-01-02", "A", Some(12.0), Some(3.0), Some("X")),
            sale("2024-01-01", "B", Some(24.0), Some(5.0), Some("Y")),
            sale("2024-01-01", "B", Some(24.0), Some(1.5), Some("Y")),
        ];
        let pivot = pivot(&rows);
        assert_eq!(pivot.dates, vec![d("2024-01-01"), d("2024-01-02")]);
        for row in &pivot.rows {
            let cell_sum: f64 = row.cells.iter().sum();
            assert_eq!(row.total, cell_sum);
        }
        // B (6.5) outranks A (5.0)
        assert_eq!(pivot.rows[0].route, "B");
        assert_eq!(pivot.rows[0].cells, vec![6.5, 0.0]);
        assert_eq!(pivot.rows[1].cells, vec![2.0, 3.0]);
    }

    #[test]
    fn null_ratios_contribute_zero_to_sums() {
        let rows = vec![
            sale("2024-01-01", "A", Some(12.0), None, Some("X")),
            sale("2024-01-01", "A", Some(12.0), Some(2.0), Some("X")),
        ];
        let pivot = pivot(&rows);
        assert_eq!(pivot.rows[0].cells, vec![2.0]);
        assert_eq!(pivot.rows[0].total, 2.0);
    }

    #[test]
    fn equal_totals_break_ties_by_route() {
        let rows = vec![
            sale("2024-01-01", "B", Some(12.0), Some(2.0), Some("X")),
            sale("2024-01-01", "A", Some(12.0), Some(2.0), Some("X")),
        ];
        let pivot = pivot(&rows);
        assert_eq!(pivot.rows[0].route, "A");
        assert_eq!(pivot.rows[1].route, "B");
    }

    #[test]
    fn single_sale_pivots_to_its_ratio() {
        // Sales {code=1, 2024-01-01, qty=10, route=A} against cake=5.
        let rows = vec![sale("2024-01-01", "A", Some(12.0), Some(2.0), Some("X"))];
        let pivot = pivot(&rows);
        assert_eq!(pivot.rows.len(), 1);
        assert_eq!(pivot.rows[0].cells, vec![2.0]);
        assert_eq!(pivot.rows[0].total, 2.0);
    }

    #[test]
    fn zero_divisor_sale_pivots_to_zero() {
        let rows = vec![sale("2024-01-01", "A", Some(12.0), None, Some("X"))];
        let pivot = pivot(&rows);
        assert_eq!(pivot.rows[0].cells, vec![0.0]);
        assert_eq!(pivot.rows[0].total, 0.0);
    }

    #[test]
    fn rounding_is_optional_and_in_place() {
        let mut rows = vec![
            sale("2024-01-01", "A", Some(12.0), Some(1.4), Some("X")),
            sale("2024-01-01", "A", Some(12.0), Some(2.5), Some("X")),
            sale("2024-01-01", "A", Some(12.0), None, Some("X")),
        ];
        round_ratios(&mut rows);
        assert_eq!(rows[0].ratio, Some(1.0));
        assert_eq!(rows[1].ratio, Some(3.0));
        assert_eq!(rows[2].ratio, None);
    }

    #[test]
    fn summary_counts_filtered_rows() {
        let rows = vec![
            sale("2024-01-01", "A", Some(12.0), Some(2.0), Some("X")),
            sale("2024-01-03", "B", Some(12.0), None, Some("X")),
        ];
        let selection = select_all(&rows);
        let summary = summary(&rows, &selection);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.total_ratio, 2.0);
        assert_eq!(summary.unique_routes, 2);
        assert_eq!(summary.days, 3);
    }
}
