//! # Back-Office Records
//!
//! Records managed by staff and customers outside the filing wizard: the
//! service price list, accountants, uploaded documents, NTN/GST
//! registration requests, notifications and generated reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::ValidationError;
use crate::identity::{Cnic, Ntn, UserId};
use crate::money::Money;
use crate::sections::SectionRecord;
use crate::validation::{self, Validate, MAX_LONG_TEXT, MAX_SHORT_TEXT};

fn active() -> bool {
    true
}

/// Require non-blank remarks when rejecting.
fn remarks_for(rejecting: bool, remarks: Option<&str>) -> Result<(), ValidationError> {
    if rejecting {
        validation::require_opt_text("remarks", remarks)?;
    }
    validation::opt_max_len("remarks", remarks, MAX_LONG_TEXT)
}

// -- Service charges ------------------------------------------------------------

/// One entry of the price list used to price cart lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCharge {
    /// Matched against `CartItem::service_type`.
    pub service_type: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default = "active")]
    pub active: bool,
}

impl Validate for ServiceCharge {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("serviceType", &self.service_type)?;
        validation::require_text("name", &self.name)?;
        validation::opt_max_len("description", self.description.as_deref(), MAX_LONG_TEXT)
    }
}

impl SectionRecord for ServiceCharge {
    const COLLECTION: Collection = Collection::ServiceCharges;
}

// -- Accountants ----------------------------------------------------------------

/// A staff accountant who reviews filings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accountant {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    /// Login identity, when the accountant has an account.
    #[serde(default)]
    pub account_id: Option<UserId>,
    #[serde(default = "active")]
    pub active: bool,
}

impl Validate for Accountant {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("name", &self.name)?;
        validation::email("email", &self.email)?;
        validation::opt_max_len("specialization", self.specialization.as_deref(), MAX_SHORT_TEXT)
    }
}

impl SectionRecord for Accountant {
    const COLLECTION: Collection = Collection::Accountants;
}

// -- Documents ------------------------------------------------------------------

/// Review state of an uploaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Metadata of a customer-uploaded supporting document. File bytes live in
/// external storage; only the reference is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub document_type: String,
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub tax_year: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl UploadedDocument {
    /// Record a review decision. Rejection requires remarks.
    pub fn review(
        &mut self,
        status: DocumentStatus,
        remarks: Option<String>,
        reviewer: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if status == DocumentStatus::Pending {
            return Err(ValidationError::UnsupportedValue {
                field: "status",
                value: "pending".into(),
                expected: "approved, rejected",
            });
        }
        remarks_for(status == DocumentStatus::Rejected, remarks.as_deref())?;
        self.status = status;
        self.remarks = remarks;
        self.reviewed_by = reviewer;
        self.reviewed_at = Some(at);
        Ok(())
    }
}

impl Validate for UploadedDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("documentType", &self.document_type)?;
        validation::require_text("fileName", &self.file_name)?;
        validation::opt_max_len("fileUrl", self.file_url.as_deref(), MAX_LONG_TEXT)?;
        if let Some(ty) = &self.tax_year {
            crate::tax_year::TaxYear::new(ty.as_str())?;
        }
        Ok(())
    }
}

impl SectionRecord for UploadedDocument {
    const COLLECTION: Collection = Collection::Documents;
}

// -- Registrations ----------------------------------------------------------------

/// Processing state of an NTN or GST registration request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    InProgress,
    Approved,
    Rejected,
}

/// Request to register for sales tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstRegistration {
    pub business_name: String,
    #[serde(default)]
    pub ntn: Option<Ntn>,
    #[serde(default)]
    pub cnic: Option<Cnic>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl GstRegistration {
    /// Move the request along. Rejection requires remarks.
    pub fn set_status(
        &mut self,
        status: RegistrationStatus,
        remarks: Option<String>,
        gst_number: Option<String>,
    ) -> Result<(), ValidationError> {
        remarks_for(status == RegistrationStatus::Rejected, remarks.as_deref())?;
        if let Some(n) = &gst_number {
            validation::require_text("gstNumber", n)?;
            self.gst_number = gst_number;
        }
        self.status = status;
        self.remarks = remarks;
        Ok(())
    }
}

impl Validate for GstRegistration {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("businessName", &self.business_name)?;
        if self.ntn.is_none() && self.cnic.is_none() {
            return Err(ValidationError::Required("ntn or cnic"));
        }
        validation::opt_max_len("businessType", self.business_type.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("businessAddress", self.business_address.as_deref(), MAX_LONG_TEXT)
    }
}

impl SectionRecord for GstRegistration {
    const COLLECTION: Collection = Collection::GstRegistrations;
}

/// Request to obtain a National Tax Number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NtnRegistration {
    pub full_name: String,
    pub cnic: Cnic,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: RegistrationStatus,
    #[serde(default)]
    pub issued_ntn: Option<Ntn>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl NtnRegistration {
    /// Move the request along. Approval may carry the issued NTN; rejection
    /// requires remarks.
    pub fn set_status(
        &mut self,
        status: RegistrationStatus,
        remarks: Option<String>,
        issued_ntn: Option<Ntn>,
    ) -> Result<(), ValidationError> {
        remarks_for(status == RegistrationStatus::Rejected, remarks.as_deref())?;
        if issued_ntn.is_some() {
            if status != RegistrationStatus::Approved {
                return Err(ValidationError::Invalid {
                    field: "issuedNtn",
                    reason: "may only be set when approving".into(),
                });
            }
            self.issued_ntn = issued_ntn;
        }
        self.status = status;
        self.remarks = remarks;
        Ok(())
    }
}

impl Validate for NtnRegistration {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("fullName", &self.full_name)?;
        if let Some(email) = &self.email {
            validation::email("email", email)?;
        }
        validation::opt_max_len("address", self.address.as_deref(), MAX_LONG_TEXT)
    }
}

impl SectionRecord for NtnRegistration {
    const COLLECTION: Collection = Collection::NtnRegistrations;
}

// -- Notifications ----------------------------------------------------------------

/// A message to one user. The recipient is the document's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if !self.read {
            self.read = true;
            self.read_at = Some(at);
        }
    }
}

impl Validate for Notification {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("title", &self.title)?;
        validation::require_text("message", &self.message)?;
        validation::max_len("message", &self.message, MAX_LONG_TEXT)
    }
}

impl SectionRecord for Notification {
    const COLLECTION: Collection = Collection::Notifications;
}

// -- Reports --------------------------------------------------------------------

/// A stored point-in-time snapshot of filing activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub title: String,
    #[serde(default)]
    pub generated_by: Option<UserId>,
    pub generated_at: DateTime<Utc>,
    pub total_filings: usize,
    pub filings_by_status: BTreeMap<String, usize>,
    pub filings_by_tax_year: BTreeMap<String, usize>,
    pub filings_by_type: BTreeMap<String, usize>,
    /// Sum of paid payment amounts.
    pub revenue: Money,
    pub paid_filings: usize,
}

impl Validate for Report {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("title", &self.title)
    }
}

impl SectionRecord for Report {
    const COLLECTION: Collection = Collection::Reports;
}
