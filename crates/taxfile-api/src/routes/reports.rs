//! # Reports API
//!
//! - **POST `/api/reports`**: count every filing and store the snapshot
//! - **GET `/api/reports`**, **GET `/api/reports/:id`**: stored snapshots
//! - **DELETE `/api/reports/:id`**: admin only

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use taxfile_core::backoffice::Report;
use taxfile_core::validation::{self, MAX_SHORT_TEXT};
use taxfile_core::{Collection, Validate, ValidationError};
use taxfile_store::{Key, Record};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json};
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_TITLE: &str = "Filing activity report";

/// Request to generate a report. The body may be `{}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateReportRequest {
    pub title: Option<String>,
}

impl Validate for GenerateReportRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("title", self.title.as_deref(), MAX_SHORT_TEXT)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports", get(list_reports).post(generate_report))
        .route("/api/reports/:id", get(get_report).delete(delete_report))
}

async fn generate_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    require_role(&caller, Role::Accountant)?;
    let req = extract_validated_json(body)?;
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    let report = taxfile_filing::report::generate(&state.store, title, caller.user_id).await?;
    Ok(ApiResponse::ok(report)
        .with_message("Report generated")
        .created())
}

async fn list_reports(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<ApiResponse<Vec<Record<Report>>>, AppError> {
    require_role(&caller, Role::Accountant)?;
    let reports = state
        .store
        .find(Collection::Reports, &Key::default())
        .iter()
        .map(|doc| doc.decode::<Report>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::ok(reports))
}

async fn get_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Record<Report>>, AppError> {
    require_role(&caller, Role::Accountant)?;
    let id = extract_path(path)?;
    let doc = state
        .store
        .get(Collection::Reports, &id)
        .ok_or_else(|| AppError::NotFound(format!("report {id} not found")))?;
    Ok(ApiResponse::ok(doc.decode()?))
}

async fn delete_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let id = extract_path(path)?;
    if !state.store.delete(Collection::Reports, &id).await? {
        return Err(AppError::NotFound(format!("report {id} not found")));
    }
    tracing::info!(report_id = %id, "deleted report");
    Ok(StatusCode::NO_CONTENT)
}
