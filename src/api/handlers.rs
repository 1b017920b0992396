//! REST API handlers for the dispatch dashboard.
//!
//! These handlers use the shared DashboardService.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::DashboardService;
use crate::error::DashboardError;
use crate::models::{EnrichedSale, FilterDomains, PivotTable, Selection, Summary};

pub type AppState = Arc<DashboardService>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn into_api_error(e: DashboardError) -> ApiError {
    let status = match &e {
        DashboardError::InvalidDateRange { .. } | DashboardError::InvalidParameter(_) => {
            StatusCode::BAD_REQUEST
        }
        DashboardError::FetchStatus { .. } | DashboardError::FetchTransport(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Filter selection as query parameters. Absent means "all"/data bounds; an
/// explicitly empty list selects nothing.
#[derive(Deserialize)]
pub struct SelectionQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Comma-separated supervisor names.
    pub supervisors: Option<String>,
    /// Comma-separated crates-per-box values.
    pub crates_box: Option<String>,
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_values(raw: &str) -> Result<Vec<f64>, DashboardError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| DashboardError::InvalidParameter(format!("crates_box value '{}'", s)))
        })
        .collect()
}

async fn resolve(
    service: &DashboardService,
    query: SelectionQuery,
) -> Result<Selection, DashboardError> {
    let supervisors = query.supervisors.as_deref().map(split_names);
    let crates_box = match query.crates_box.as_deref() {
        Some(raw) => Some(split_values(raw)?),
        None => None,
    };
    service
        .resolve_selection(query.start, query.end, supervisors, crates_box)
        .await
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct SummaryResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Serialize)]
pub struct PivotResponse {
    pub empty: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub pivot: PivotTable,
}

#[derive(Serialize)]
pub struct RowsResponse {
    pub empty: bool,
    pub records: usize,
    pub rows: Vec<EnrichedSale>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/domains
pub async fn get_domains(
    State(service): State<AppState>,
) -> Result<Json<FilterDomains>, ApiError> {
    match service.domains().await {
        Ok(domains) => Ok(Json(domains)),
        Err(e) => Err(into_api_error(e)),
    }
}

/// GET /api/v1/summary
pub async fn get_summary(
    State(service): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let selection = resolve(&service, query).await.map_err(into_api_error)?;
    match service.summary(&selection).await {
        Ok(summary) => Ok(Json(SummaryResponse {
            start: selection.start,
            end: selection.end,
            summary,
        })),
        Err(e) => Err(into_api_error(e)),
    }
}

/// GET /api/v1/pivot
pub async fn get_pivot(
    State(service): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<PivotResponse>, ApiError> {
    let selection = resolve(&service, query).await.map_err(into_api_error)?;
    match service.pivot(&selection).await {
        Ok(pivot) => Ok(Json(PivotResponse {
            empty: pivot.is_empty(),
            start: selection.start,
            end: selection.end,
            pivot,
        })),
        Err(e) => Err(into_api_error(e)),
    }
}

/// GET /api/v1/rows
pub async fn get_rows(
    State(service): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<RowsResponse>, ApiError> {
    let selection = resolve(&service, query).await.map_err(into_api_error)?;
    match service.filtered_rows(&selection).await {
        Ok(rows) => Ok(Json(RowsResponse {
            empty: rows.is_empty(),
            records: rows.len(),
            rows,
        })),
        Err(e) => Err(into_api_error(e)),
    }
}

/// GET /api/v1/export/pivot.csv
pub async fn export_pivot(
    State(service): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = resolve(&service, query).await.map_err(into_api_error)?;
    match service.pivot_csv(&selection).await {
        Ok((filename, body)) => Ok(csv_download(filename, body)),
        Err(e) => Err(into_api_error(e)),
    }
}

/// GET /api/v1/export/raw.csv
pub async fn export_raw(
    State(service): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = resolve(&service, query).await.map_err(into_api_error)?;
    match service.raw_csv(&selection).await {
        Ok((filename, body)) => Ok(csv_download(filename, body)),
        Err(e) => Err(into_api_error(e)),
    }
}

/// POST /api/v1/refresh
pub async fn refresh(State(service): State<AppState>) -> impl IntoResponse {
    service.refresh();
    Json(serde_json::json!({"status": "refreshed"}))
}

fn csv_download(filename: String, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}
