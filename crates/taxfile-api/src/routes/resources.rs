//! # Back-Office Resources API
//!
//! One generic CRUD router per [`Resource`]:
//!
//! ```text
//! GET    /api/<resource>        list
//! POST   /api/<resource>        create (201)
//! GET    /api/<resource>/:id    fetch
//! PUT    /api/<resource>/:id    full replace
//! DELETE /api/<resource>/:id    delete (204)
//! ```
//!
//! Owner-scoped resources are keyed by user. A `user` caller only ever sees
//! and writes their own rows, and cannot set review fields; staff see all.
//!
//! Review actions have their own PATCH routes:
//! `/api/documents/:id/review`, `/api/gst-registrations/:id/status`,
//! `/api/ntn-registrations/:id/status` and `/api/notifications/:id/read`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taxfile_core::backoffice::{
    Accountant, DocumentStatus, GstRegistration, Notification, NtnRegistration,
    RegistrationStatus, ServiceCharge, UploadedDocument,
};
use taxfile_core::sections::SectionRecord;
use taxfile_core::{KeyShape, Ntn, UserId, ValidationError};
use taxfile_store::{Document, Key, Record};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query, extract_validated_json};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Resource trait
// ---------------------------------------------------------------------------

/// A record type served by the generic CRUD router.
pub trait Resource: SectionRecord + 'static {
    /// Route prefix, e.g. `/api/documents`.
    const PATH: &'static str;
    /// Singular name used in messages.
    const NAME: &'static str;
    /// Minimum role to list and fetch.
    const READ_ROLE: Role;
    const CREATE_ROLE: Role;
    /// Minimum role to replace and delete.
    const WRITE_ROLE: Role;

    /// Whether rows belong to a user.
    fn owned() -> bool {
        Self::COLLECTION.key_shape() == KeyShape::Owner
    }

    /// Apply a write by the owning user (not staff): fields only staff may
    /// set are taken from `existing`, or reset on create.
    fn owner_write(self, _existing: Option<&Self>) -> Self {
        self
    }
}

impl Resource for ServiceCharge {
    const PATH: &'static str = "/api/service-charges";
    const NAME: &'static str = "service charge";
    const READ_ROLE: Role = Role::User;
    const CREATE_ROLE: Role = Role::Admin;
    const WRITE_ROLE: Role = Role::Admin;
}

impl Resource for Accountant {
    const PATH: &'static str = "/api/accountants";
    const NAME: &'static str = "accountant";
    const READ_ROLE: Role = Role::Accountant;
    const CREATE_ROLE: Role = Role::Admin;
    const WRITE_ROLE: Role = Role::Admin;
}

impl Resource for UploadedDocument {
    const PATH: &'static str = "/api/documents";
    const NAME: &'static str = "document";
    const READ_ROLE: Role = Role::User;
    const CREATE_ROLE: Role = Role::User;
    const WRITE_ROLE: Role = Role::User;

    fn owner_write(mut self, existing: Option<&Self>) -> Self {
        match existing {
            Some(prev) => {
                self.status = prev.status;
                self.remarks = prev.remarks.clone();
                self.reviewed_by = prev.reviewed_by;
                self.reviewed_at = prev.reviewed_at;
            }
            None => {
                self.status = DocumentStatus::Pending;
                self.remarks = None;
                self.reviewed_by = None;
                self.reviewed_at = None;
            }
        }
        self
    }
}

impl Resource for GstRegistration {
    const PATH: &'static str = "/api/gst-registrations";
    const NAME: &'static str = "GST registration";
    const READ_ROLE: Role = Role::User;
    const CREATE_ROLE: Role = Role::User;
    const WRITE_ROLE: Role = Role::User;

    fn owner_write(mut self, existing: Option<&Self>) -> Self {
        self.status = existing.map_or(RegistrationStatus::Pending, |p| p.status);
        self.gst_number = existing.and_then(|p| p.gst_number.clone());
        self.remarks = existing.and_then(|p| p.remarks.clone());
        self
    }
}

impl Resource for NtnRegistration {
    const PATH: &'static str = "/api/ntn-registrations";
    const NAME: &'static str = "NTN registration";
    const READ_ROLE: Role = Role::User;
    const CREATE_ROLE: Role = Role::User;
    const WRITE_ROLE: Role = Role::User;

    fn owner_write(mut self, existing: Option<&Self>) -> Self {
        self.status = existing.map_or(RegistrationStatus::Pending, |p| p.status);
        self.issued_ntn = existing.and_then(|p| p.issued_ntn.clone());
        self.remarks = existing.and_then(|p| p.remarks.clone());
        self
    }
}

impl Resource for Notification {
    const PATH: &'static str = "/api/notifications";
    const NAME: &'static str = "notification";
    const READ_ROLE: Role = Role::User;
    const CREATE_ROLE: Role = Role::Admin;
    const WRITE_ROLE: Role = Role::Admin;
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(crud::<ServiceCharge>())
        .merge(crud::<Accountant>())
        .merge(crud::<UploadedDocument>())
        .merge(crud::<GstRegistration>())
        .merge(crud::<NtnRegistration>())
        .merge(crud::<Notification>())
        .route("/api/documents/:id/review", patch(review_document))
        .route("/api/gst-registrations/:id/status", patch(update_gst_status))
        .route("/api/ntn-registrations/:id/status", patch(update_ntn_status))
        .route("/api/notifications/:id/read", patch(mark_notification_read))
}

/// The five CRUD routes for one resource.
pub fn crud<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(R::PATH, get(list::<R>).post(create::<R>))
        .route(
            &format!("{}/:id", R::PATH),
            get(fetch::<R>).put(replace::<R>).delete(remove::<R>),
        )
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Staff only: narrow an owner-scoped list to one user.
    pub user_id: Option<Uuid>,
}

/// Create body: the record itself plus, for staff, the owning user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody<R> {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub record: R,
}

#[derive(Debug, Deserialize)]
pub struct DocumentReview {
    pub status: DocumentStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstStatusUpdate {
    pub status: RegistrationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NtnStatusUpdate {
    pub status: RegistrationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub issued_ntn: Option<Ntn>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found<R: Resource>(id: &Uuid) -> AppError {
    AppError::NotFound(format!("{} {id} not found", R::NAME))
}

/// Fetch one document after checking role and ownership.
fn load<R: Resource>(
    state: &AppState,
    caller: &CallerIdentity,
    id: &Uuid,
    role: Role,
) -> Result<Document, AppError> {
    require_role(caller, role)?;
    let doc = state
        .store
        .get(R::COLLECTION, id)
        .ok_or_else(|| not_found::<R>(id))?;
    if R::owned() {
        caller.ensure_can_access(doc.key.user_id)?;
    }
    Ok(doc)
}

/// Load, change and store one record.
async fn modify<R, F>(
    state: &AppState,
    caller: &CallerIdentity,
    id: &Uuid,
    role: Role,
    change: F,
) -> Result<Record<R>, AppError>
where
    R: Resource,
    F: FnOnce(&mut R) -> Result<(), ValidationError>,
{
    let doc = load::<R>(state, caller, id, role)?;
    let mut record = doc.decode::<R>()?.body;
    change(&mut record)?;
    let updated = state.store.update(R::COLLECTION, id, &record).await?;
    Ok(updated.decode()?)
}

fn decode_all<R: DeserializeOwned>(docs: &[Document]) -> Result<Vec<Record<R>>, AppError> {
    docs.iter()
        .map(Document::decode::<R>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

// ---------------------------------------------------------------------------
// CRUD handlers
// ---------------------------------------------------------------------------

async fn list<R: Resource>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<Record<R>>>, AppError> {
    require_role(&caller, R::READ_ROLE)?;
    let query = extract_query(query)?;
    let filter = if !R::owned() {
        Key::default()
    } else if caller.is_staff() {
        query
            .user_id
            .map(|u| Key::user(UserId::from_uuid(u)))
            .unwrap_or_default()
    } else {
        Key::user(caller.require_user_id()?)
    };
    let docs = state.store.find(R::COLLECTION, &filter);
    Ok(ApiResponse::ok(decode_all::<R>(&docs)?))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateBody<R>>, JsonRejection>,
) -> Result<Response, AppError> {
    require_role(&caller, R::CREATE_ROLE)?;
    let CreateBody { user_id, record } = extract_json(body)?;

    let (key, record) = if !R::owned() {
        (Key::default(), record)
    } else if caller.is_staff() {
        let owner = user_id
            .map(UserId::from_uuid)
            .or(caller.user_id)
            .ok_or_else(|| AppError::BadRequest("userId is required".into()))?;
        (Key::user(owner), record)
    } else {
        (Key::user(caller.require_user_id()?), record.owner_write(None))
    };
    record.validate()?;

    let doc = state.store.insert(R::COLLECTION, key, &record).await?;
    tracing::info!(
        collection = R::COLLECTION.as_str(),
        id = %doc.id,
        owner = ?doc.key.user_id,
        "created record"
    );
    Ok(ApiResponse::ok(doc.decode::<R>()?)
        .with_message(format!("{} created", R::NAME))
        .created())
}

async fn fetch<R: Resource>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Record<R>>, AppError> {
    let id = extract_path(path)?;
    let doc = load::<R>(&state, &caller, &id, R::READ_ROLE)?;
    Ok(ApiResponse::ok(doc.decode()?))
}

async fn replace<R: Resource>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<R>, JsonRejection>,
) -> Result<ApiResponse<Record<R>>, AppError> {
    let id = extract_path(path)?;
    let incoming = extract_validated_json(body)?;
    let doc = load::<R>(&state, &caller, &id, R::WRITE_ROLE)?;
    let record = if caller.is_staff() {
        incoming
    } else {
        let existing = doc.decode::<R>()?.body;
        incoming.owner_write(Some(&existing))
    };

    let updated = state.store.update(R::COLLECTION, &id, &record).await?;
    tracing::info!(collection = R::COLLECTION.as_str(), id = %id, "replaced record");
    Ok(ApiResponse::ok(updated.decode()?).with_message(format!("{} updated", R::NAME)))
}

async fn remove<R: Resource>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(path)?;
    load::<R>(&state, &caller, &id, R::WRITE_ROLE)?;
    if !state.store.delete(R::COLLECTION, &id).await? {
        return Err(not_found::<R>(&id));
    }
    tracing::info!(collection = R::COLLECTION.as_str(), id = %id, "deleted record");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Review actions
// ---------------------------------------------------------------------------

async fn review_document(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<DocumentReview>, JsonRejection>,
) -> Result<ApiResponse<Record<UploadedDocument>>, AppError> {
    let id = extract_path(path)?;
    let DocumentReview { status, remarks } = extract_json(body)?;
    let reviewer = caller.user_id;
    let record = modify::<UploadedDocument, _>(&state, &caller, &id, Role::Accountant, |doc| {
        doc.review(status, remarks, reviewer, Utc::now())
    })
    .await?;
    tracing::info!(document_id = %id, status = ?status, "document reviewed");
    Ok(ApiResponse::ok(record).with_message("Document reviewed"))
}

async fn update_gst_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<GstStatusUpdate>, JsonRejection>,
) -> Result<ApiResponse<Record<GstRegistration>>, AppError> {
    let id = extract_path(path)?;
    let GstStatusUpdate { status, remarks, gst_number } = extract_json(body)?;
    let record = modify::<GstRegistration, _>(&state, &caller, &id, Role::Accountant, |reg| {
        reg.set_status(status, remarks, gst_number)
    })
    .await?;
    tracing::info!(registration_id = %id, status = ?status, "GST registration status updated");
    Ok(ApiResponse::ok(record).with_message("Registration status updated"))
}

async fn update_ntn_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<NtnStatusUpdate>, JsonRejection>,
) -> Result<ApiResponse<Record<NtnRegistration>>, AppError> {
    let id = extract_path(path)?;
    let NtnStatusUpdate { status, remarks, issued_ntn } = extract_json(body)?;
    let record = modify::<NtnRegistration, _>(&state, &caller, &id, Role::Accountant, |reg| {
        reg.set_status(status, remarks, issued_ntn)
    })
    .await?;
    tracing::info!(registration_id = %id, status = ?status, "NTN registration status updated");
    Ok(ApiResponse::ok(record).with_message("Registration status updated"))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Record<Notification>>, AppError> {
    let id = extract_path(path)?;
    let record = modify::<Notification, _>(&state, &caller, &id, Role::User, |n| {
        n.mark_read(Utc::now());
        Ok(())
    })
    .await?;
    Ok(ApiResponse::ok(record))
}
