use chrono::NaiveDate;
use serde::Serialize;

/// Row as materialized by the enrichment query, before date coercion.
///
/// Dimension columns are `Option` because the join is a left join: a sale
/// with an unreconciled product code or an unmapped route keeps its row and
/// gets NULLs here.
#[derive(Debug, Clone)]
pub struct RawSaleRow {
    pub sales_date: Option<String>,
    pub route: Option<String>,
    pub crates_box: Option<f64>,
    pub ratio: Option<f64>,
    pub supervisor: Option<String>,
}

/// Sale enriched with product and supervisor dimensions, date coerced.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedSale {
    pub sales_date: NaiveDate,
    pub route: String,
    /// Product's crates-per-box value (`Cr_Bo`), used as a filter domain.
    pub crates_box: Option<f64>,
    /// Derived quantity / cake-count. NULL when the divisor is NULL or zero.
    pub ratio: Option<f64>,
    pub supervisor: Option<String>,
}

/// Filter domains derived from the loaded base table. Date pickers are
/// bounded by `min_date`/`max_date`; both multi-selects default to the full
/// domain.
#[derive(Debug, Clone, Serialize)]
pub struct FilterDomains {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub supervisors: Vec<String>,
    pub crates_box: Vec<f64>,
}

/// A concrete filter selection. All conditions are conjunctive.
#[derive(Debug, Clone)]
pub struct Selection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Selected supervisors. An empty set matches nothing.
    pub supervisors: Vec<String>,
    /// Selected crates-per-box values. An empty set matches nothing.
    pub crates_box: Vec<f64>,
}

/// Headline metrics over the filtered rows.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub records: usize,
    pub total_ratio: f64,
    pub unique_routes: usize,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PivotRow {
    pub route: String,
    /// One summed ratio per entry of `PivotTable::dates`, missing cells 0.
    pub cells: Vec<f64>,
    pub total: f64,
}

/// Route-by-date matrix of summed ratios, sorted by `total` descending.
#[derive(Debug, Clone, Serialize)]
pub struct PivotTable {
    /// Distinct dates present in the filtered rows, ascending.
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
