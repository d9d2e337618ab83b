//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{user_id}:{secret}   role-bound token
//! Bearer {secret}                    legacy format (treated as Admin)
//! ```
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers receive it as an extractor parameter; no
//! handler reads identity from anywhere else.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use taxfile_core::UserId;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Roles ordered by privilege: `User < Accountant < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A taxpayer. Reads and writes their own filings and records.
    User,
    /// Staff who review filings, documents and registrations.
    Accountant,
    /// Full access, including the price list and accountants.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Accountant => "accountant",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    /// Bound user. `None` for legacy and auth-disabled admin callers.
    pub user_id: Option<UserId>,
}

impl CallerIdentity {
    /// Whether the caller has at least `minimum`.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// Accountants and admins.
    pub fn is_staff(&self) -> bool {
        self.has_role(Role::Accountant)
    }

    /// The bound user id, or 401 for callers acting on "my" data without one.
    pub fn require_user_id(&self) -> Result<UserId, AppError> {
        self.user_id.ok_or_else(|| {
            AppError::Unauthorized("this endpoint requires a token bound to a user id".into())
        })
    }

    /// Staff may act for anyone; users only for themselves.
    pub fn ensure_can_access(&self, owner: Option<UserId>) -> Result<(), AppError> {
        if self.is_staff() || (self.user_id.is_some() && self.user_id == owner) {
            Ok(())
        } else {
            Err(AppError::Forbidden("access to another user's data denied".into()))
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in format `{role}:{user_id}:{secret}` or `{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity {
                    role: Role::Admin,
                    user_id: None,
                })
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role, user, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }
            let role = match *role {
                "admin" => Role::Admin,
                "accountant" => Role::Accountant,
                "user" => Role::User,
                other => return Err(format!("unknown role: {other}")),
            };
            let user_id = if user.is_empty() {
                None
            } else {
                Some(UserId::from_uuid(
                    user.parse::<Uuid>()
                        .map_err(|e| format!("invalid user_id: {e}"))?,
                ))
            };
            Ok(CallerIdentity { role, user_id })
        }
        _ => Err("invalid token format: expected {role}:{user_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the bearer token and inject the caller's identity.
///
/// When `AuthConfig.token` is `None`, every request runs as an admin with no
/// user id (auth disabled).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header.map(|h| h.strip_prefix("Bearer ")) {
                Some(Some(provided)) => match parse_bearer_token(provided, expected) {
                    Ok(identity) => {
                        request.extensions_mut().insert(identity);
                        next.run(request).await
                    }
                    Err(msg) => {
                        tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                        unauthorized_response(&msg)
                    }
                },
                Some(None) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request.extensions_mut().insert(CallerIdentity {
                role: Role::Admin,
                user_id: None,
            });
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
        timestamp: Utc::now(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn whoami(caller: CallerIdentity) -> String {
        format!(
            "{}:{}",
            caller.role.as_str(),
            caller.user_id.map(|u| u.to_string()).unwrap_or_default()
        )
    }

    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route("/test", get(whoami))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/test");
        if let Some(value) = auth {
            req = req.header("authorization", value);
        }
        let response = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn roles_are_ordered() {
        assert!(Role::User < Role::Accountant);
        assert!(Role::Accountant < Role::Admin);
    }

    #[test]
    fn legacy_token_is_admin() {
        let id = parse_bearer_token("s3cret", "s3cret").unwrap();
        assert_eq!(id.role, Role::Admin);
        assert!(id.user_id.is_none());
        assert!(parse_bearer_token("wrong", "s3cret").is_err());
    }

    #[test]
    fn role_token_binds_user() {
        let user = Uuid::new_v4();
        let id = parse_bearer_token(&format!("user:{user}:s3cret"), "s3cret").unwrap();
        assert_eq!(id.role, Role::User);
        assert_eq!(id.user_id, Some(UserId::from_uuid(user)));

        assert!(parse_bearer_token(&format!("user:{user}:nope"), "s3cret").is_err());
        assert!(parse_bearer_token("owner::s3cret", "s3cret").is_err());
        assert!(parse_bearer_token("user:not-a-uuid:s3cret", "s3cret").is_err());
        assert!(parse_bearer_token("a:b", "s3cret").is_err());
    }

    #[test]
    fn users_only_access_themselves() {
        let me = UserId::new();
        let user = CallerIdentity { role: Role::User, user_id: Some(me) };
        assert!(user.ensure_can_access(Some(me)).is_ok());
        assert!(user.ensure_can_access(Some(UserId::new())).is_err());
        assert!(user.ensure_can_access(None).is_err());

        let staff = CallerIdentity { role: Role::Accountant, user_id: None };
        assert!(staff.ensure_can_access(Some(me)).is_ok());
        assert!(staff.require_user_id().is_err());
    }

    #[test]
    fn require_role_forbids_lower_roles() {
        let user = CallerIdentity { role: Role::User, user_id: None };
        assert!(matches!(require_role(&user, Role::Accountant), Err(AppError::Forbidden(_))));
        let admin = CallerIdentity { role: Role::Admin, user_id: None };
        assert!(require_role(&admin, Role::Accountant).is_ok());
    }

    #[test]
    fn auth_config_debug_redacts() {
        let cfg = AuthConfig { token: Some("super-secret".into()) };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let (status, _) = call(test_app(Some("s3cret".into())), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn basic_scheme_is_401() {
        let (status, _) = call(test_app(Some("s3cret".into())), Some("Basic s3cret")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_injects_identity() {
        let user = Uuid::new_v4();
        let header = format!("Bearer accountant:{user}:s3cret");
        let (status, body) = call(test_app(Some("s3cret".into())), Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("accountant:{user}"));
    }

    #[tokio::test]
    async fn disabled_auth_is_admin_without_user() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "admin:");
    }
}
