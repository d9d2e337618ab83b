//! # taxfile-api: Axum HTTP Surface for the Tax Filing Service
//!
//! Serves the comprehensive filing wizard, step progress tracking and the
//! back-office resources over one document store.
//!
//! ## API Surface
//!
//! | Prefix                                  | Module                         |
//! |-----------------------------------------|--------------------------------|
//! | `/api/tax-filing/comprehensive/*`       | [`routes::comprehensive`]      |
//! | `/api/filing-steps/*`                   | [`routes::filing_steps`]       |
//! | `/api/tax-filings/*`                    | [`routes::filings`]            |
//! | `/api/reports/*`                        | [`routes::reports`]            |
//! | `/api/service-charges`, `/api/documents`, ... | [`routes::resources`]    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Maximum accepted request body.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::comprehensive::router())
        .merge(routes::filing_steps::router())
        .merge(routes::filings::router())
        .merge(routes::reports::router())
        .merge(routes::resources::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state.clone());

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when a configured database does not answer.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let Some(pool) = state.store.pool() else {
        return (StatusCode::OK, "ready");
    };
    match taxfile_store::ping(pool).await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
