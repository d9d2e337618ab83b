//! Aggregate read of one filing.

use serde::Serialize;
use taxfile_core::steps;
use taxfile_core::{TaxYear, UserId};
use taxfile_store::DocumentStore;

use crate::error::FilingError;
use crate::snapshot::{FilingSummary, Snapshot};

/// Everything the wizard needs to render one tax year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingView {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub summary: FilingSummary,
    pub completion_percentage: u8,
    pub completed_steps: usize,
    pub total_steps: usize,
}

/// Reads aggregate views. Works whether or not a filing exists yet.
#[derive(Debug, Clone)]
pub struct FilingReader {
    store: DocumentStore,
}

impl FilingReader {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn read(&self, user: UserId, tax_year: &TaxYear) -> Result<FilingView, FilingError> {
        let snapshot = Snapshot::load(&self.store, user, tax_year)?;
        let progress = steps::evaluate(&snapshot);
        tracing::debug!(
            user_id = %user,
            tax_year = %tax_year,
            has_filing = snapshot.tax_filing.is_some(),
            completed_steps = progress.completed_steps,
            "read filing aggregate"
        );
        Ok(FilingView {
            summary: snapshot.summary(),
            completion_percentage: progress.completion_percentage,
            completed_steps: progress.completed_steps,
            total_steps: progress.total_steps,
            snapshot,
        })
    }
}
