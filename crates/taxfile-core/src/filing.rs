//! # Filing
//!
//! The top-level per-user-per-year tax record and its lifecycle vocabulary.
//! The `(userId, taxYear)` key lives on the stored document, not in the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::UserId;
use crate::money::Money;

/// Kind of return being filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingType {
    Individual,
    Business,
    /// Association of persons.
    Aop,
    Salaried,
}

impl FilingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
            Self::Aop => "aop",
            Self::Salaried => "salaried",
        }
    }
}

impl std::str::FromStr for FilingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "individual" => Ok(Self::Individual),
            "business" => Ok(Self::Business),
            "aop" => Ok(Self::Aop),
            "salaried" => Ok(Self::Salaried),
            other => Err(ValidationError::UnsupportedValue {
                field: "filingType",
                value: other.to_string(),
                expected: "individual, business, aop, salaried",
            }),
        }
    }
}

impl std::fmt::Display for FilingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filing lifecycle status.
///
/// Only [`FilingStatus::Completed`] blocks further submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Pending,
    Processing,
    UnderReview,
    Completed,
    Rejected,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::UnderReview => "under_review",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the filing is closed to resubmission.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Parse a status an accountant may set during review.
    ///
    /// `processing` is reserved for the submission pipeline and rejected.
    pub fn parse_review(s: &str) -> Result<Self, ValidationError> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "under_review" => Ok(Self::UnderReview),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::UnsupportedValue {
                field: "status",
                value: other.to_string(),
                expected: "pending, under_review, completed, rejected",
            }),
        }
    }
}

impl std::str::FromStr for FilingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "processing" => Ok(Self::Processing),
            other => Self::parse_review(other).map_err(|_| ValidationError::UnsupportedValue {
                field: "status",
                value: other.to_string(),
                expected: "pending, processing, under_review, completed, rejected",
            }),
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer paid for the filing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Jazzcash,
    Easypaisa,
}

/// Payment settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Payment sub-record carried on the filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// One status transition in the filing's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    #[serde(default)]
    pub from: Option<FilingStatus>,
    pub to: FilingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub at: DateTime<Utc>,
}

/// Body of a document in the `tax_filings` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxFiling {
    pub filing_type: FilingType,
    pub status: FilingStatus,
    #[serde(default)]
    pub processing_steps: Vec<String>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub assigned_accountant: Option<UserId>,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaxFiling {
    /// A freshly opened filing, as created by the first submission.
    pub fn open(filing_type: FilingType) -> Self {
        Self {
            filing_type,
            status: FilingStatus::Processing,
            processing_steps: Vec::new(),
            history: Vec::new(),
            remarks: None,
            admin_notes: None,
            assigned_accountant: None,
            payment: None,
            submitted_at: None,
            completed_at: None,
        }
    }

    /// Move to `to`, recording the transition. A no-op transition is still
    /// recorded when remarks are supplied.
    pub fn transition(
        &mut self,
        to: FilingStatus,
        changed_by: Option<UserId>,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) {
        if self.status == to && remarks.is_none() {
            return;
        }
        self.history.push(StatusChange {
            from: Some(self.status),
            to,
            changed_by,
            remarks: remarks.clone(),
            at,
        });
        self.status = to;
        if remarks.is_some() {
            self.remarks = remarks;
        }
        if to.is_completed() {
            self.completed_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filing_type_parses_snake_case() {
        assert_eq!("aop".parse::<FilingType>().unwrap(), FilingType::Aop);
        assert!("corporate".parse::<FilingType>().is_err());
    }

    #[test]
    fn review_status_excludes_processing() {
        assert!(FilingStatus::parse_review("processing").is_err());
        assert!(FilingStatus::parse_review("archived").is_err());
        assert_eq!(
            FilingStatus::parse_review("under_review").unwrap(),
            FilingStatus::UnderReview
        );
        assert_eq!(
            "processing".parse::<FilingStatus>().unwrap(),
            FilingStatus::Processing
        );
    }

    #[test]
    fn open_filing_starts_processing() {
        let f = TaxFiling::open(FilingType::Individual);
        assert_eq!(f.status, FilingStatus::Processing);
        assert!(f.history.is_empty());
    }

    #[test]
    fn transition_records_history_and_completion() {
        let mut f = TaxFiling::open(FilingType::Salaried);
        let now = Utc::now();
        f.transition(FilingStatus::Completed, None, None, now);
        assert_eq!(f.status, FilingStatus::Completed);
        assert_eq!(f.completed_at, Some(now));
        assert_eq!(f.history.len(), 1);
        assert_eq!(f.history[0].from, Some(FilingStatus::Processing));
    }

    #[test]
    fn same_status_without_remarks_is_noop() {
        let mut f = TaxFiling::open(FilingType::Business);
        f.transition(FilingStatus::Processing, None, None, Utc::now());
        assert!(f.history.is_empty());
    }

    #[test]
    fn body_serializes_camel_case() {
        let f = TaxFiling::open(FilingType::Individual);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["filingType"], "individual");
        assert_eq!(json["status"], "processing");
        assert!(json["processingSteps"].as_array().unwrap().is_empty());
    }
}
