//! # API Route Modules
//!
//! - `comprehensive`: one-shot wizard submission and the aggregate read.
//! - `filing_steps`: twelve-step progress, resume and the review surface.
//! - `filings`: read-only filing records.
//! - `reports`: generated filing activity reports.
//! - `resources`: generic CRUD for the back-office records.

pub mod comprehensive;
pub mod filing_steps;
pub mod filings;
pub mod reports;
pub mod resources;

use taxfile_core::UserId;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;

/// The user a request acts on: `requested` when given (staff, or the
/// caller themselves), otherwise the caller's own id.
pub(crate) fn subject_user(
    caller: &CallerIdentity,
    requested: Option<Uuid>,
) -> Result<UserId, AppError> {
    match requested.map(UserId::from_uuid) {
        Some(user) => {
            caller.ensure_can_access(Some(user))?;
            Ok(user)
        }
        None => caller.require_user_id(),
    }
}
