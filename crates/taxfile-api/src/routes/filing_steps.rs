//! # Filing Step Progress API
//!
//! - **GET `/api/filing-steps/me`**: the caller's progress
//! - **GET `/api/filing-steps/admin/all`**: one row per filing (staff)
//! - **GET `/api/filing-steps/:userId`**: a user's progress
//! - **GET `/api/filing-steps/:userId/detailed`**: progress plus record counts
//! - **GET `/api/filing-steps/:userId/resume`**: where the wizard should reopen
//! - **PATCH `/api/filing-steps/:userId/status`**: review decision (staff)
//!
//! Every endpoint accepts `?taxYear=`; without it the latest filing and all
//! of the user's records are probed.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use taxfile_core::{FilingStatus, Progress, TaxFiling, UserId};
use taxfile_filing::{DetailedProgress, OverviewFilter, OverviewRow, Resume, StatusUpdate};
use taxfile_store::Record;
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query, optional_tax_year};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsQuery {
    pub tax_year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub status: Option<String>,
    pub tax_year: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/filing-steps/me", get(my_progress))
        .route("/api/filing-steps/admin/all", get(all_progress))
        .route("/api/filing-steps/:user_id", get(user_progress))
        .route("/api/filing-steps/:user_id/detailed", get(detailed_progress))
        .route("/api/filing-steps/:user_id/resume", get(resume_point))
        .route("/api/filing-steps/:user_id/status", patch(update_filing_status))
}

/// Resolve the path user and check the caller may see them.
fn target_user(
    caller: &CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<UserId, AppError> {
    let user = UserId::from_uuid(extract_path(path)?);
    caller.ensure_can_access(Some(user))?;
    Ok(user)
}

/// GET /api/filing-steps/me
#[utoipa::path(
    get,
    path = "/api/filing-steps/me",
    params(("taxYear" = Option<String>, Query, description = "Restrict to one tax year")),
    responses(
        (status = 200, description = "Twelve-step progress for the caller"),
        (status = 401, description = "No user bound to the caller", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn my_progress(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<ApiResponse<Progress>, AppError> {
    let user = caller.require_user_id()?;
    let tax_year = optional_tax_year(extract_query(query)?.tax_year.as_deref())?;
    Ok(ApiResponse::ok(state.steps().progress(user, tax_year.as_ref())?))
}

/// GET /api/filing-steps/admin/all
#[utoipa::path(
    get,
    path = "/api/filing-steps/admin/all",
    params(
        ("status" = Option<String>, Query, description = "Filing status filter"),
        ("taxYear" = Option<String>, Query, description = "Tax year filter"),
    ),
    responses(
        (status = 200, description = "One progress row per filing"),
        (status = 400, description = "Unknown status", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn all_progress(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<OverviewQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<OverviewRow>>, AppError> {
    require_role(&caller, Role::Accountant)?;
    let query = extract_query(query)?;
    let filter = OverviewFilter {
        status: query
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<FilingStatus>)
            .transpose()?,
        tax_year: optional_tax_year(query.tax_year.as_deref())?,
    };
    Ok(ApiResponse::ok(state.steps().overview(&filter)?))
}

/// GET /api/filing-steps/{userId}
#[utoipa::path(
    get,
    path = "/api/filing-steps/{userId}",
    params(
        ("userId" = Uuid, Path, description = "User whose progress to read"),
        ("taxYear" = Option<String>, Query, description = "Restrict to one tax year"),
    ),
    responses(
        (status = 200, description = "Twelve-step progress"),
        (status = 403, description = "A user reading someone else", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn user_progress(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<ApiResponse<Progress>, AppError> {
    let user = target_user(&caller, path)?;
    let tax_year = optional_tax_year(extract_query(query)?.tax_year.as_deref())?;
    Ok(ApiResponse::ok(state.steps().progress(user, tax_year.as_ref())?))
}

/// GET /api/filing-steps/{userId}/detailed
#[utoipa::path(
    get,
    path = "/api/filing-steps/{userId}/detailed",
    params(
        ("userId" = Uuid, Path, description = "User whose progress to read"),
        ("taxYear" = Option<String>, Query, description = "Restrict to one tax year"),
    ),
    responses(
        (status = 200, description = "Progress, per-step record counts and the filing"),
        (status = 403, description = "A user reading someone else", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn detailed_progress(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<ApiResponse<DetailedProgress>, AppError> {
    let user = target_user(&caller, path)?;
    let tax_year = optional_tax_year(extract_query(query)?.tax_year.as_deref())?;
    Ok(ApiResponse::ok(state.steps().detailed(user, tax_year.as_ref())?))
}

/// GET /api/filing-steps/{userId}/resume
#[utoipa::path(
    get,
    path = "/api/filing-steps/{userId}/resume",
    params(
        ("userId" = Uuid, Path, description = "User whose wizard to resume"),
        ("taxYear" = Option<String>, Query, description = "Restrict to one tax year"),
    ),
    responses(
        (status = 200, description = "First incomplete step and its route; the cart once all are done"),
        (status = 403, description = "A user reading someone else", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn resume_point(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<ApiResponse<Resume>, AppError> {
    let user = target_user(&caller, path)?;
    let tax_year = optional_tax_year(extract_query(query)?.tax_year.as_deref())?;
    Ok(ApiResponse::ok(state.steps().resume(user, tax_year.as_ref())?))
}

/// PATCH /api/filing-steps/{userId}/status
#[utoipa::path(
    patch,
    path = "/api/filing-steps/{userId}/status",
    params(
        ("userId" = Uuid, Path, description = "Owner of the filing"),
        ("taxYear" = Option<String>, Query, description = "Which year's filing; the latest otherwise"),
    ),
    responses(
        (status = 200, description = "Status changed and recorded in the filing history"),
        (status = 400, description = "Status outside pending/under_review/completed/rejected, or rejection without remarks", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 404, description = "User has no filing", body = crate::error::ErrorBody),
    ),
    tag = "filing_steps"
)]
pub(crate) async fn update_filing_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<StepsQuery>, QueryRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<ApiResponse<Record<TaxFiling>>, AppError> {
    require_role(&caller, Role::Accountant)?;
    let user = UserId::from_uuid(extract_path(path)?);
    let mut update = extract_json(body)?;
    if update.tax_year.is_none() {
        update.tax_year = extract_query(query)?.tax_year;
    }
    let filing = state
        .steps()
        .update_status(user, caller.user_id, update)
        .await?;
    Ok(ApiResponse::ok(filing).with_message("Filing status updated"))
}
