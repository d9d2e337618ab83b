//! Stored documents, their keys, and typed views over them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taxfile_core::{Collection, FilingId, TaxYear, UserId};
use uuid::Uuid;

use crate::error::StoreError;

/// The key a document is stored under. Also used as a filter: a filter
/// matches a document when every `Some` field is equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub user_id: Option<UserId>,
    pub tax_year: Option<TaxYear>,
    pub filing_id: Option<FilingId>,
}

impl Key {
    /// Key for a wizard section or filing.
    pub fn user_year(user_id: UserId, tax_year: &TaxYear) -> Self {
        Self {
            user_id: Some(user_id),
            tax_year: Some(tax_year.clone()),
            filing_id: None,
        }
    }

    /// Key for records hanging off a filing.
    pub fn filing(filing_id: FilingId) -> Self {
        Self {
            filing_id: Some(filing_id),
            ..Self::default()
        }
    }

    /// Key for owner-scoped records, or a filter on owner across all years.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Narrow a filter to one tax year when given.
    pub fn with_tax_year(mut self, tax_year: Option<&TaxYear>) -> Self {
        if let Some(ty) = tax_year {
            self.tax_year = Some(ty.clone());
        }
        self
    }

    /// Whether `key` satisfies this filter.
    pub fn matches(&self, key: &Key) -> bool {
        fn field<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
            want.as_ref().map_or(true, |w| have.as_ref() == Some(w))
        }
        field(&self.user_id, &key.user_id)
            && field(&self.tax_year, &key.tax_year)
            && field(&self.filing_id, &key.filing_id)
    }
}

/// A JSON body stored in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub collection: Collection,
    pub key: Key,
    pub body: serde_json::Value,
    /// Insertion order across the whole store. Reads are ordered by it.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Decode the body into `T`, keeping the envelope fields.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Record<T>, StoreError> {
        let body = serde_json::from_value(self.body.clone())
            .map_err(StoreError::codec(self.collection))?;
        Ok(Record {
            id: self.id,
            user_id: self.key.user_id,
            tax_year: self.key.tax_year.clone(),
            filing_id: self.key.filing_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body,
        })
    }

    /// The untyped wire view: envelope fields plus the body's own fields.
    pub fn view(&self) -> Record<serde_json::Value> {
        Record {
            id: self.id,
            user_id: self.key.user_id,
            tax_year: self.key.tax_year.clone(),
            filing_id: self.key.filing_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body: self.body.clone(),
        }
    }
}

/// A typed document. Serializes flat: `{id, userId, taxYear, ..., <body fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_year: Option<TaxYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_id: Option<FilingId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Record<T> {
    /// This record's id as a filing id. Meaningful for `tax_filings` only.
    pub fn as_filing_id(&self) -> FilingId {
        FilingId::from_uuid(self.id)
    }
}
