//! Shared business logic for the dashboard.
//!
//! This service layer is used by the REST handlers and the CLI report. It
//! owns the provisioning step and the base-table cache; every read path goes
//! through it.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::cache::TableCache;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::{EnrichedSale, FilterDomains, PivotTable, Selection, Summary};
use crate::{export, pipeline, provision};

pub struct DashboardService {
    config: DashboardConfig,
    cache: TableCache,
}

impl DashboardService {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = TableCache::new(config.db_path.clone());
        Self { config, cache }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The materialized base table: provisioned if a source URL is
    /// configured, then loaded through the cache.
    pub async fn base_rows(&self) -> Result<Arc<Vec<EnrichedSale>>> {
        if let Some(url) = &self.config.source_url {
            provision::ensure_local_copy(&self.config.db_path, url, &self.config.fetch).await?;
        }
        let config = self.config.clone();
        self.cache.get_or_load(|| pipeline::materialize(&config))
    }

    pub async fn domains(&self) -> Result<FilterDomains> {
        let rows = self.base_rows().await?;
        pipeline::domains(&rows).ok_or(DashboardError::EmptySource)
    }

    /// Fill the unset parts of a partial selection from the data bounds:
    /// absent dates default to the data's min/max, absent sets to "all".
    pub async fn resolve_selection(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        supervisors: Option<Vec<String>>,
        crates_box: Option<Vec<f64>>,
    ) -> Result<Selection> {
        let domains = self.domains().await?;
        let selection = Selection {
            start: start.unwrap_or(domains.min_date),
            end: end.unwrap_or(domains.max_date),
            supervisors: supervisors.unwrap_or_else(|| domains.supervisors.clone()),
            crates_box: crates_box.unwrap_or_else(|| domains.crates_box.clone()),
        };
        if selection.start > selection.end {
            return Err(DashboardError::InvalidDateRange {
                start: selection.start,
                end: selection.end,
            });
        }
        Ok(selection)
    }

    pub async fn filtered_rows(&self, selection: &Selection) -> Result<Vec<EnrichedSale>> {
        let rows = self.base_rows().await?;
        pipeline::apply_filters(&rows, selection)
    }

    pub async fn summary(&self, selection: &Selection) -> Result<Summary> {
        let rows = self.filtered_rows(selection).await?;
        Ok(pipeline::summary(&rows, selection))
    }

    pub async fn pivot(&self, selection: &Selection) -> Result<PivotTable> {
        let rows = self.filtered_rows(selection).await?;
        Ok(pipeline::pivot(&rows))
    }

    /// Pivot CSV artifact as (filename, body).
    pub async fn pivot_csv(&self, selection: &Selection) -> Result<(String, String)> {
        let pivot = self.pivot(selection).await?;
        Ok((
            export::pivot_filename(selection.start, selection.end),
            export::pivot_csv(&pivot)?,
        ))
    }

    /// Raw-rows CSV artifact as (filename, body).
    pub async fn raw_csv(&self, selection: &Selection) -> Result<(String, String)> {
        let rows = self.filtered_rows(selection).await?;
        Ok((
            export::raw_filename(selection.start, selection.end),
            export::raw_csv(&rows)?,
        ))
    }

    /// Drop the cached base table; the next read reloads from the file.
    pub fn refresh(&self) {
        self.cache.invalidate();
    }
}
