//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation, store and filing errors to HTTP status codes with a
//! JSON body carrying a machine-readable code, a message and a timestamp.
//! Raw internal error messages are attached only in debug builds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taxfile_filing::FilingError;
use taxfile_store::StoreError;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    pub timestamp: DateTime<Utc>,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Raw cause of an internal error. Debug builds only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request is malformed or refers to something unusable (400).
    #[error("{0}")]
    BadRequest(String),

    /// A field failed validation (400).
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials, or no user id bound (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Insufficient role or not the owner (403).
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Build the JSON body for this error.
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        let (message, details) = match self {
            Self::Internal(raw) => (
                "An internal error occurred".to_string(),
                cfg!(debug_assertions).then(|| serde_json::json!({ "message": raw })),
            ),
            other => (other.to_string(), None),
        };
        ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        if let Self::Internal(raw) = &self {
            tracing::error!(error = %raw, "internal server error");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<taxfile_core::ValidationError> for AppError {
    fn from(err: taxfile_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<FilingError> for AppError {
    fn from(err: FilingError) -> Self {
        match err {
            FilingError::Validation(e) => e.into(),
            FilingError::NotFound(msg) => Self::NotFound(msg),
            FilingError::Store(e) => e.into(),
            e @ (FilingError::MissingField(_)
            | FilingError::AlreadyCompleted { .. }
            | FilingError::UnknownService(_)) => Self::BadRequest(e.to_string()),
            e @ FilingError::Codec { .. } => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use taxfile_core::{Collection, TaxYear, ValidationError};
    use uuid::Uuid;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn into_response_bad_request() {
        let (status, body) = response_parts(AppError::BadRequest("taxYear is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "BAD_REQUEST");
        assert_eq!(body.error.message, "taxYear is required");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_internal_hides_message() {
        let (status, body) = response_parts(AppError::Internal("pool timed out".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(!body.error.message.contains("pool"));
        assert_eq!(body.error.details.is_some(), cfg!(debug_assertions));
    }

    #[test]
    fn filing_errors_map_to_client_statuses() {
        let year = TaxYear::new("2024").unwrap();
        let err: AppError = FilingError::AlreadyCompleted { tax_year: year }.into();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("already completed")));

        let err: AppError = FilingError::MissingField("filingType").into();
        assert!(matches!(err, AppError::BadRequest(m) if m == "filingType is required"));

        let err: AppError = FilingError::Validation(ValidationError::InvalidCnic("123".into())).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = FilingError::NotFound("no filing".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn store_not_found_is_404() {
        let err: AppError = StoreError::NotFound {
            collection: Collection::Documents,
            id: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
