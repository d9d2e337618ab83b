//! # Comprehensive Filing API
//!
//! - **POST `/api/tax-filing/comprehensive/submit`**: apply a sparse wizard
//!   payload for the caller in one all-or-nothing write.
//! - **GET `/api/tax-filing/comprehensive/data?taxYear=`**: the full
//!   aggregate for one tax year, with summary and completion.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use taxfile_filing::{FilingView, SubmitRequest};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, optional_tax_year};
use crate::response::ApiResponse;
use crate::routes::subject_user;
use crate::state::AppState;

/// Query parameters for the aggregate read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub tax_year: Option<String>,
    /// Staff only: read another user's filing.
    pub user_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tax-filing/comprehensive/submit", post(submit_comprehensive))
        .route("/api/tax-filing/comprehensive/data", get(get_comprehensive_data))
}

/// POST /api/tax-filing/comprehensive/submit
#[utoipa::path(
    post,
    path = "/api/tax-filing/comprehensive/submit",
    responses(
        (status = 201, description = "Filing and every supplied section saved"),
        (status = 400, description = "Missing taxYear/filingType, invalid section, or filing already completed", body = crate::error::ErrorBody),
        (status = 401, description = "No user bound to the caller", body = crate::error::ErrorBody),
        (status = 500, description = "Store failure; nothing was written", body = crate::error::ErrorBody),
    ),
    tag = "comprehensive"
)]
pub(crate) async fn submit_comprehensive(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let user = caller.require_user_id()?;
    let req = extract_json(body)?;
    let outcome = state.writer().submit(user, req).await?;
    Ok(ApiResponse::ok(outcome)
        .with_message("Tax filing submitted successfully")
        .created())
}

/// GET /api/tax-filing/comprehensive/data
#[utoipa::path(
    get,
    path = "/api/tax-filing/comprehensive/data",
    params(
        ("taxYear" = String, Query, description = "Tax year, e.g. 2024-25"),
        ("userId" = Option<Uuid>, Query, description = "Staff only: whose filing to read"),
    ),
    responses(
        (status = 200, description = "Aggregate view; sections are null or empty when absent"),
        (status = 400, description = "taxYear missing or malformed", body = crate::error::ErrorBody),
        (status = 403, description = "Reading another user's filing", body = crate::error::ErrorBody),
    ),
    tag = "comprehensive"
)]
pub(crate) async fn get_comprehensive_data(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Result<ApiResponse<FilingView>, AppError> {
    let query = extract_query(query)?;
    let tax_year = optional_tax_year(query.tax_year.as_deref())?
        .ok_or_else(|| AppError::BadRequest("taxYear is required".into()))?;
    let user = subject_user(&caller, query.user_id)?;
    let view = state.reader().read(user, &tax_year)?;
    Ok(ApiResponse::ok(view))
}
