//! # Step Progress
//!
//! Store-backed [`StepProbe`] and the operations of the filing-steps
//! surface: progress, detailed progress, resume, staff status review and
//! the staff overview of every filing.
//!
//! Probes are scoped to a user and, optionally, one tax year. Without a
//! tax year every year counts. Personal info is probed through the user's
//! latest filing.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use taxfile_core::steps::{self, StepStatus, STEPS};
use taxfile_core::validation;
use taxfile_core::{Collection, FilingStatus, Progress, StepProbe, TaxFiling, TaxYear, UserId};
use taxfile_store::{DocumentStore, Key, Record, StoreError};

use crate::error::FilingError;

/// Answers step checks from the committed store.
#[derive(Debug)]
pub struct StoreProbe<'a> {
    store: &'a DocumentStore,
    filter: Key,
    filing: Option<Record<TaxFiling>>,
}

impl<'a> StoreProbe<'a> {
    pub fn new(
        store: &'a DocumentStore,
        user: UserId,
        tax_year: Option<&TaxYear>,
    ) -> Result<Self, StoreError> {
        let filter = Key::user(user).with_tax_year(tax_year);
        let filing = store
            .find_latest(Collection::TaxFilings, &filter)
            .map(|d| d.decode::<TaxFiling>())
            .transpose()?;
        Ok(Self { store, filter, filing })
    }

    /// The filing the probe resolved, if any.
    pub fn filing(&self) -> Option<&Record<TaxFiling>> {
        self.filing.as_ref()
    }
}

impl StepProbe for StoreProbe<'_> {
    fn filing_status(&self) -> Option<FilingStatus> {
        self.filing.as_ref().map(|f| f.body.status)
    }

    fn count(&self, collection: Collection) -> usize {
        match collection {
            Collection::PersonalInfo => self.filing.as_ref().map_or(0, |f| {
                self.store
                    .count(collection, &Key::filing(f.as_filing_id()))
            }),
            _ => self.store.count(collection, &self.filter),
        }
    }
}

/// Progress plus the raw counts behind each step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedProgress {
    #[serde(flatten)]
    pub progress: Progress,
    /// Step id to collection name to record count.
    pub record_counts: BTreeMap<&'static str, BTreeMap<&'static str, usize>>,
    pub tax_filing: Option<Record<TaxFiling>>,
}

/// Where the wizard should resume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub current_step: Option<StepStatus>,
    pub path: &'static str,
    pub completion_percentage: u8,
}

/// Staff review of a filing's status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusUpdate {
    pub status: String,
    pub remarks: Option<String>,
    pub tax_year: Option<String>,
}

/// Filters for the staff overview.
#[derive(Debug, Clone, Default)]
pub struct OverviewFilter {
    pub status: Option<FilingStatus>,
    pub tax_year: Option<TaxYear>,
}

/// One filing in the staff overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRow {
    pub user_id: Option<UserId>,
    pub tax_year: Option<TaxYear>,
    pub tax_filing: Record<TaxFiling>,
    pub progress: Progress,
}

/// Step progress over the committed store.
#[derive(Debug, Clone)]
pub struct StepService {
    store: DocumentStore,
}

impl StepService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn progress(&self, user: UserId, tax_year: Option<&TaxYear>) -> Result<Progress, FilingError> {
        let probe = StoreProbe::new(&self.store, user, tax_year)?;
        Ok(steps::evaluate(&probe))
    }

    pub fn detailed(
        &self,
        user: UserId,
        tax_year: Option<&TaxYear>,
    ) -> Result<DetailedProgress, FilingError> {
        let probe = StoreProbe::new(&self.store, user, tax_year)?;
        let record_counts = STEPS
            .iter()
            .map(|def| {
                let counts = def
                    .check
                    .collections()
                    .iter()
                    .map(|c| (c.as_str(), probe.count(*c)))
                    .collect();
                (def.id, counts)
            })
            .collect();
        Ok(DetailedProgress {
            progress: steps::evaluate(&probe),
            record_counts,
            tax_filing: probe.filing,
        })
    }

    pub fn resume(&self, user: UserId, tax_year: Option<&TaxYear>) -> Result<Resume, FilingError> {
        let progress = self.progress(user, tax_year)?;
        Ok(Resume {
            path: progress.resume_path(),
            completion_percentage: progress.completion_percentage,
            current_step: progress.current_step,
        })
    }

    /// Move the user's latest filing (optionally in one tax year) to a
    /// review status, recording who did it.
    pub async fn update_status(
        &self,
        user: UserId,
        reviewer: Option<UserId>,
        update: StatusUpdate,
    ) -> Result<Record<TaxFiling>, FilingError> {
        let status = FilingStatus::parse_review(&update.status)?;
        let remarks = update
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if status == FilingStatus::Rejected && remarks.is_none() {
            return Err(FilingError::MissingField("remarks"));
        }
        validation::opt_max_len("remarks", remarks.as_deref(), validation::MAX_LONG_TEXT)?;
        let tax_year = update
            .tax_year
            .as_deref()
            .map(TaxYear::new)
            .transpose()?;

        let filter = Key::user(user).with_tax_year(tax_year.as_ref());
        let mut tx = self.store.begin_exclusive().await;
        let doc = tx
            .find(Collection::TaxFilings, &filter)
            .pop()
            .ok_or_else(|| FilingError::NotFound(format!("no tax filing found for user {user}")))?;

        let mut filing = doc.decode::<TaxFiling>()?.body;
        let from = filing.status;
        filing.transition(status, reviewer, remarks, Utc::now());
        let updated = tx.update(Collection::TaxFilings, &doc.id, &filing)?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user,
            filing_id = %doc.id,
            from = %from,
            to = %status,
            "filing status updated"
        );
        Ok(updated.decode()?)
    }

    /// One progress row per filing, newest last.
    pub fn overview(&self, filter: &OverviewFilter) -> Result<Vec<OverviewRow>, FilingError> {
        let mut rows = Vec::new();
        for doc in self.store.list(Collection::TaxFilings) {
            let record = doc.decode::<TaxFiling>()?;
            if filter.status.is_some_and(|s| s != record.body.status) {
                continue;
            }
            if filter.tax_year.as_ref().is_some_and(|ty| record.tax_year.as_ref() != Some(ty)) {
                continue;
            }
            let progress = match record.user_id {
                Some(user) => self.progress(user, record.tax_year.as_ref())?,
                None => steps::evaluate(&OrphanFiling(record.body.status)),
            };
            rows.push(OverviewRow {
                user_id: record.user_id,
                tax_year: record.tax_year.clone(),
                tax_filing: record,
                progress,
            });
        }
        Ok(rows)
    }
}

/// A filing with no owner: only the filing step can be complete.
struct OrphanFiling(FilingStatus);

impl StepProbe for OrphanFiling {
    fn filing_status(&self) -> Option<FilingStatus> {
        Some(self.0)
    }

    fn count(&self, _: Collection) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taxfile_core::steps::CART_PATH;

    use crate::request::SubmitRequest;
    use crate::writer::FilingWriter;

    async fn submit(store: &DocumentStore, user: UserId, v: serde_json::Value) {
        let req: SubmitRequest = serde_json::from_value(v).unwrap();
        FilingWriter::new(store.clone()).submit(user, req).await.unwrap();
    }

    fn update(status: &str, remarks: Option<&str>) -> StatusUpdate {
        StatusUpdate {
            status: status.into(),
            remarks: remarks.map(Into::into),
            tax_year: None,
        }
    }

    #[tokio::test]
    async fn tax_year_and_personal_info_is_seventeen_percent() {
        let store = DocumentStore::in_memory();
        let user = UserId::new();
        submit(&store, user, json!({
            "taxYear": "2024", "filingType": "individual",
            "personalInfo": {"fullName": "Ali Raza", "cnic": "3520212345671"}
        }))
        .await;

        let p = StepService::new(store).progress(user, None).unwrap();
        assert_eq!(p.completed_steps, 2);
        assert_eq!(p.completion_percentage, 17);
        assert_eq!(p.current_step.map(|s| s.id), Some("income_sources"));
        assert_eq!(p.filing_status, Some(FilingStatus::UnderReview));
    }

    #[tokio::test]
    async fn income_details_completes_on_any_category() {
        let store = DocumentStore::in_memory();
        let user = UserId::new();
        submit(&store, user, json!({
            "taxYear": "2024", "filingType": "individual",
            "incomeDetails": {"dividendIncome": {"amount": 10}}
        }))
        .await;

        let d = StepService::new(store).detailed(user, None).unwrap();
        let step = d.progress.steps.iter().find(|s| s.id == "income_details").unwrap();
        assert!(step.completed);
        assert_eq!(d.record_counts["income_details"]["dividend_income"], 1);
        assert_eq!(d.record_counts["income_details"]["salary_income"], 0);
        assert!(d.tax_filing.is_some());
    }

    #[tokio::test]
    async fn tax_year_filter_scopes_probes() {
        let store = DocumentStore::in_memory();
        let user = UserId::new();
        submit(&store, user, json!({
            "taxYear": "2023", "filingType": "individual", "expenses": {"rent": 1}
        }))
        .await;

        let service = StepService::new(store);
        assert_eq!(service.progress(user, None).unwrap().completed_steps, 2);
        let y = TaxYear::new("2024").unwrap();
        assert_eq!(service.progress(user, Some(&y)).unwrap().completed_steps, 0);
    }

    #[tokio::test]
    async fn resume_points_at_first_gap_then_cart() {
        let store = DocumentStore::in_memory();
        let user = UserId::new();
        let service = StepService::new(store.clone());
        assert_eq!(service.resume(user, None).unwrap().path, "/tax-filing/tax-year");

        submit(&store, user, json!({
            "taxYear": "2024", "filingType": "individual",
            "personalInfo": {"fullName": "Ali Raza", "cnic": "3520212345671"},
            "incomeSources": {"salary": true},
            "incomeDetails": {"salaryIncome": {"annualSalary": 1}},
            "taxCredits": {},
            "deductions": {"zakat": [{"amount": 1}]},
            "openingWealth": {},
            "assetSelection": {},
            "assetDetails": {"cashBalance": {"amount": 1}},
            "liabilities": {"otherLiabilities": [{"amount": 1}]},
            "expenses": {},
            "wrapUp": {"termsAccepted": false}
        }))
        .await;

        let r = service.resume(user, None).unwrap();
        assert!(r.current_step.is_none());
        assert_eq!(r.path, CART_PATH);
        assert_eq!(r.completion_percentage, 100);
        assert!(service.progress(user, None).unwrap().can_submit);
    }

    #[tokio::test]
    async fn rejection_requires_remarks() {
        let store = DocumentStore::in_memory();
        let user = UserId::new();
        submit(&store, user, json!({"taxYear": "2024", "filingType": "individual"})).await;
        let service = StepService::new(store);

        let err = service
            .update_status(user, None, update("rejected", Some("   ")))
            .await
            .unwrap_err();
        assert!(matches!(err, FilingError::MissingField("remarks")));

        let err = service
            .update_status(user, None, update("processing", None))
            .await
            .unwrap_err();
        assert!(matches!(err, FilingError::Validation(_)));

        let reviewer = UserId::new();
        let f = service
            .update_status(user, Some(reviewer), update("rejected", Some("CNIC copy unreadable")))
            .await
            .unwrap();
        assert_eq!(f.body.status, FilingStatus::Rejected);
        assert_eq!(f.body.remarks.as_deref(), Some("CNIC copy unreadable"));
        let last = f.body.history.last().unwrap();
        assert_eq!(last.changed_by, Some(reviewer));
        assert_eq!(last.from, Some(FilingStatus::UnderReview));
    }

    #[tokio::test]
    async fn status_update_without_filing_is_not_found() {
        let service = StepService::new(DocumentStore::in_memory());
        let err = service
            .update_status(UserId::new(), None, update("completed", None))
            .await
            .unwrap_err();
        assert!(matches!(err, FilingError::NotFound(_)));
    }

    #[tokio::test]
    async fn overview_lists_and_filters_filings() {
        let store = DocumentStore::in_memory();
        let (a, b) = (UserId::new(), UserId::new());
        submit(&store, a, json!({"taxYear": "2024", "filingType": "individual"})).await;
        submit(&store, b, json!({
            "taxYear": "2023", "filingType": "salaried", "wrapUp": {"termsAccepted": true}
        }))
        .await;

        let service = StepService::new(store);
        assert_eq!(service.overview(&OverviewFilter::default()).unwrap().len(), 2);

        let completed = service
            .overview(&OverviewFilter {
                status: Some(FilingStatus::Completed),
                tax_year: None,
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].user_id, Some(b));
        assert_eq!(completed[0].progress.completed_steps, 2);

        let y2024 = service
            .overview(&OverviewFilter {
                status: None,
                tax_year: Some(TaxYear::new("2024").unwrap()),
            })
            .unwrap();
        assert_eq!(y2024.len(), 1);
        assert_eq!(y2024[0].user_id, Some(a));
    }
}
