//! Filing activity reports.
//!
//! A report is a point-in-time count over every filing, stored in the
//! `reports` collection so later reads return what was generated.

use std::collections::BTreeMap;

use chrono::Utc;
use taxfile_core::backoffice::Report;
use taxfile_core::{Collection, Money, PaymentStatus, TaxFiling, UserId};
use taxfile_store::{DocumentStore, Key, Record};

use crate::error::FilingError;

/// Count every filing into a new [`Report`]. Nothing is stored.
pub fn compile(
    store: &DocumentStore,
    title: &str,
    generated_by: Option<UserId>,
) -> Result<Report, FilingError> {
    let mut by_status = BTreeMap::new();
    let mut by_year = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    let mut revenue = Money::ZERO;
    let mut paid = 0;

    let filings = store.list(Collection::TaxFilings);
    for doc in &filings {
        let record = doc.decode::<TaxFiling>()?;
        *by_status.entry(record.body.status.as_str().to_string()).or_insert(0) += 1;
        *by_type.entry(record.body.filing_type.as_str().to_string()).or_insert(0) += 1;
        if let Some(ty) = &record.tax_year {
            *by_year.entry(ty.as_str().to_string()).or_insert(0) += 1;
        }
        if let Some(p) = record.body.payment.as_ref().filter(|p| p.status == PaymentStatus::Paid) {
            revenue = revenue.saturating_add(p.amount);
            paid += 1;
        }
    }

    Ok(Report {
        title: title.to_string(),
        generated_by,
        generated_at: Utc::now(),
        total_filings: filings.len(),
        filings_by_status: by_status,
        filings_by_tax_year: by_year,
        filings_by_type: by_type,
        revenue,
        paid_filings: paid,
    })
}

/// Compile a report and store it.
pub async fn generate(
    store: &DocumentStore,
    title: &str,
    generated_by: Option<UserId>,
) -> Result<Record<Report>, FilingError> {
    let report = compile(store, title, generated_by)?;
    let doc = store.insert(Collection::Reports, Key::default(), &report).await?;
    tracing::info!(
        report_id = %doc.id,
        total_filings = report.total_filings,
        revenue = %report.revenue,
        "generated filing report"
    );
    Ok(doc.decode()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::request::SubmitRequest;
    use crate::writer::FilingWriter;

    async fn submit(store: &DocumentStore, v: serde_json::Value) {
        let req: SubmitRequest = serde_json::from_value(v).unwrap();
        FilingWriter::new(store.clone())
            .submit(UserId::new(), req)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_store_reports_zeroes() {
        let r = compile(&DocumentStore::in_memory(), "Empty", None).unwrap();
        assert_eq!(r.total_filings, 0);
        assert!(r.filings_by_status.is_empty());
        assert!(r.revenue.is_zero());
    }

    #[tokio::test]
    async fn counts_filings_and_paid_revenue() {
        let store = DocumentStore::in_memory();
        submit(&store, json!({
            "taxYear": "2024", "filingType": "individual",
            "checkout": {"paymentMethod": "card", "transactionReference": "TX-1", "amount": 3000}
        }))
        .await;
        submit(&store, json!({
            "taxYear": "2024", "filingType": "salaried",
            "wrapUp": {"termsAccepted": true},
            "checkout": {"paymentMethod": "easypaisa", "amount": 999}
        }))
        .await;
        submit(&store, json!({"taxYear": "2023", "filingType": "individual"})).await;

        let admin = UserId::new();
        let stored = generate(&store, "Monthly", Some(admin)).await.unwrap();
        let r = &stored.body;
        assert_eq!(r.total_filings, 3);
        assert_eq!(r.filings_by_status["under_review"], 2);
        assert_eq!(r.filings_by_status["completed"], 1);
        assert_eq!(r.filings_by_tax_year["2024"], 2);
        assert_eq!(r.filings_by_type["individual"], 2);
        assert_eq!(r.revenue, Money::from_rupees(3000));
        assert_eq!(r.paid_filings, 1);
        assert_eq!(r.generated_by, Some(admin));
        assert_eq!(store.list(Collection::Reports).len(), 1);
    }
}
