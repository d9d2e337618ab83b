//! # Filing Records API
//!
//! Read-only access to stored filings. Users see their own; staff see all.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use taxfile_core::{Collection, FilingStatus, TaxFiling};
use taxfile_store::{Key, Record};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, optional_tax_year};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingQuery {
    pub status: Option<String>,
    pub tax_year: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tax-filings", get(list_filings))
        .route("/api/tax-filings/:id", get(get_filing))
}

async fn list_filings(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<FilingQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<Record<TaxFiling>>>, AppError> {
    let query = extract_query(query)?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<FilingStatus>)
        .transpose()?;
    let tax_year = optional_tax_year(query.tax_year.as_deref())?;

    let owner = if caller.is_staff() {
        Key::default()
    } else {
        Key::user(caller.require_user_id()?)
    };
    let filter = owner.with_tax_year(tax_year.as_ref());

    let mut filings = Vec::new();
    for doc in state.store.find(Collection::TaxFilings, &filter) {
        let record = doc.decode::<TaxFiling>()?;
        if status.map_or(true, |s| s == record.body.status) {
            filings.push(record);
        }
    }
    Ok(ApiResponse::ok(filings))
}

async fn get_filing(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Record<TaxFiling>>, AppError> {
    let id = extract_path(path)?;
    let doc = state
        .store
        .get(Collection::TaxFilings, &id)
        .ok_or_else(|| AppError::NotFound(format!("tax filing {id} not found")))?;
    caller.ensure_can_access(doc.key.user_id)?;
    Ok(ApiResponse::ok(doc.decode()?))
}
