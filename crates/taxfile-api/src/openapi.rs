//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI spec, served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the filing wizard surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tax Filing API",
        version = "0.3.0",
        description = "Comprehensive income tax filing wizard: one-shot submission, aggregate reads and twelve-step progress tracking."
    ),
    paths(
        // Comprehensive
        crate::routes::comprehensive::submit_comprehensive,
        crate::routes::comprehensive::get_comprehensive_data,
        // Filing steps
        crate::routes::filing_steps::my_progress,
        crate::routes::filing_steps::all_progress,
        crate::routes::filing_steps::user_progress,
        crate::routes::filing_steps::detailed_progress,
        crate::routes::filing_steps::resume_point,
        crate::routes::filing_steps::update_filing_status,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::auth::Role,
    )),
    tags(
        (name = "comprehensive", description = "Comprehensive filing submission and aggregate read"),
        (name = "filing_steps", description = "Step progress, resume and review status"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_wizard_paths() {
        let spec = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/tax-filing/comprehensive/submit"));
        assert!(paths.contains_key("/api/tax-filing/comprehensive/data"));
        assert!(paths.contains_key("/api/filing-steps/{userId}/status"));
        assert!(spec["components"]["schemas"].get("ErrorBody").is_some());
    }
}
