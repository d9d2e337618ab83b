//! # Comprehensive Submission Writer
//!
//! Applies a sparse wizard payload to every affected collection inside one
//! store transaction. Nothing is visible to readers until the whole
//! submission commits; any error drops the transaction.
//!
//! Order of work:
//!
//! 1. Header and section validation. Failures here touch nothing.
//! 2. Completed filings are closed to resubmission.
//! 3. Find-or-create the filing, price the cart against the active price
//!    list, then run the [`Plan`] through upsert / replace-all.
//! 4. Record checkout, move the filing to `completed` or `under_review`,
//!    append processing steps, commit.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use taxfile_core::backoffice::ServiceCharge;
use taxfile_core::sections::{Cart, CartItem};
use taxfile_core::{
    Collection, FilingId, FilingStatus, KeyShape, Payment, PaymentStatus, TaxFiling, TaxYear,
    UserId, Validate,
};
use taxfile_store::{Document, DocumentStore, Key, Record, Transaction};

use crate::error::FilingError;
use crate::plan::{Plan, PlanEntry, SectionWrite};
use crate::request::SubmitRequest;
use crate::snapshot::{CartView, FilingSummary, Snapshot};

/// Result of a committed submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub tax_filing: Record<TaxFiling>,
    /// Section name to saved record(s), nested by category where the
    /// section has several.
    pub saved_data: Map<String, Value>,
    pub summary: FilingSummary,
    pub cart: CartView,
    pub checkout: Option<Payment>,
    /// Steps logged by this submission only.
    pub processing_steps: Vec<String>,
}

/// Writes comprehensive submissions.
#[derive(Debug, Clone)]
pub struct FilingWriter {
    store: DocumentStore,
}

impl FilingWriter {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Validate and apply `req` for `user`, all-or-nothing.
    pub async fn submit(
        &self,
        user: UserId,
        req: SubmitRequest,
    ) -> Result<SubmitOutcome, FilingError> {
        let (tax_year, filing_type) = req.header()?;
        req.validate()?;

        let mut tx = self.store.begin_exclusive().await;
        let filing_key = Key::user_year(user, &tax_year);
        let existing = tx.find_one(Collection::TaxFilings, &filing_key);

        let (filing_doc, mut filing, mut steps) = match existing {
            Some(doc) => {
                let record = doc.decode::<TaxFiling>()?;
                if record.body.status.is_completed() {
                    return Err(FilingError::AlreadyCompleted { tax_year });
                }
                let mut filing = record.body;
                filing.filing_type = filing_type;
                (doc, filing, vec!["Tax filing updated".to_string()])
            }
            None => {
                let filing = TaxFiling::open(filing_type);
                let doc = tx.insert(Collection::TaxFilings, filing_key, &filing)?;
                (doc, filing, vec!["Tax filing created".to_string()])
            }
        };
        let filing_id = FilingId::from_uuid(filing_doc.id);

        let priced = match &req.cart {
            Some(cart) => Some(price_cart(&tx, cart)?),
            None => None,
        };

        let plan = Plan::build(&req, priced.as_deref())?;
        let mut saved_data = Map::new();
        for entry in plan.entries() {
            let key = section_key(entry.collection, user, &tax_year, filing_id);
            let saved = execute(&mut tx, entry, key)?;
            record_saved(&mut saved_data, entry, saved);
            steps.push(format!("{} saved", entry.label));
        }

        let snapshot = Snapshot::load(&tx, user, &tax_year)?;
        let summary = snapshot.summary();
        let now = Utc::now();

        if let Some(checkout) = &req.checkout {
            let reference = checkout.transaction_reference.clone();
            let paid = reference.is_some();
            filing.payment = Some(Payment {
                method: checkout.payment_method,
                status: if paid { PaymentStatus::Paid } else { PaymentStatus::Pending },
                amount: checkout.amount.unwrap_or(snapshot.cart.total),
                transaction_reference: reference,
                paid_at: paid.then_some(now),
            });
            steps.push("Payment recorded".to_string());
        }

        let status = if req.terms_accepted() {
            FilingStatus::Completed
        } else {
            FilingStatus::UnderReview
        };
        filing.transition(status, Some(user), None, now);
        filing.submitted_at = Some(now);
        steps.push(match status {
            FilingStatus::Completed => "Filing completed".to_string(),
            _ => "Filing submitted for review".to_string(),
        });
        filing.processing_steps.extend(steps.iter().cloned());

        let updated = tx.update(Collection::TaxFilings, &filing_doc.id, &filing)?;
        let tax_filing = updated.decode::<TaxFiling>()?;

        let changes = tx.commit().await?;
        tracing::info!(
            user_id = %user,
            tax_year = %tax_year,
            filing_id = %filing_id,
            sections = plan.entries().len(),
            changes,
            status = %status,
            "comprehensive filing submitted"
        );

        Ok(SubmitOutcome {
            checkout: tax_filing.body.payment.clone(),
            tax_filing,
            saved_data,
            summary,
            cart: snapshot.cart,
            processing_steps: steps,
        })
    }
}

/// Price every cart line from the active price list visible to `tx`.
fn price_cart(tx: &Transaction, cart: &Cart) -> Result<Vec<CartItem>, FilingError> {
    let charges = tx
        .find(Collection::ServiceCharges, &Key::default())
        .iter()
        .map(|d| d.decode::<ServiceCharge>().map(|r| r.body))
        .collect::<Result<Vec<_>, _>>()?;

    cart.items
        .iter()
        .map(|item| {
            charges
                .iter()
                .find(|c| c.active && c.service_type == item.service_type)
                .map(|c| item.clone().priced(c.price))
                .ok_or_else(|| FilingError::UnknownService(item.service_type.clone()))
        })
        .collect()
}

/// The key a section's records are stored under.
fn section_key(collection: Collection, user: UserId, tax_year: &TaxYear, filing: FilingId) -> Key {
    match collection.key_shape() {
        KeyShape::UserYear => Key::user_year(user, tax_year),
        KeyShape::Filing => Key::filing(filing),
        KeyShape::Owner => Key::user(user),
        KeyShape::Global => Key::default(),
    }
}

fn execute(tx: &mut Transaction, entry: &PlanEntry, key: Key) -> Result<Value, FilingError> {
    let view = |doc: &Document| serde_json::to_value(doc.view());
    let encoded = match &entry.write {
        SectionWrite::Upsert(body) => {
            let doc = tx.upsert_by_key(entry.collection, key, body)?;
            view(&doc)
        }
        SectionWrite::ReplaceAll(rows) => {
            let docs = tx.replace_all(entry.collection, key, rows)?;
            docs.iter().map(view).collect::<Result<Vec<_>, _>>().map(Value::Array)
        }
    };
    encoded.map_err(|source| FilingError::Codec {
        section: entry.section,
        source,
    })
}

fn record_saved(saved: &mut Map<String, Value>, entry: &PlanEntry, value: Value) {
    match entry.field {
        None => {
            saved.insert(entry.section.to_string(), value);
        }
        Some(field) => {
            let slot = saved
                .entry(entry.section)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(fields) = slot {
                fields.insert(field.to_string(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taxfile_core::PaymentMethod;

    fn year() -> TaxYear {
        TaxYear::new("2024").unwrap()
    }

    fn req(v: Value) -> SubmitRequest {
        serde_json::from_value(v).unwrap()
    }

    async fn seed_price(store: &DocumentStore, service: &str, price: i64, active: bool) {
        store
            .insert(
                Collection::ServiceCharges,
                Key::default(),
                &json!({"serviceType": service, "name": service, "price": price, "active": active}),
            )
            .await
            .unwrap();
    }

    fn costs(store: &DocumentStore, user: UserId) -> Vec<i64> {
        store
            .find(Collection::PropertyAssets, &Key::user_year(user, &year()))
            .iter()
            .map(|d| d.body["cost"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn first_submission_creates_filing_under_review() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        let out = writer
            .submit(user, req(json!({"taxYear": "2024", "filingType": "individual"})))
            .await
            .unwrap();
        assert_eq!(out.tax_filing.body.status, FilingStatus::UnderReview);
        assert!(out.tax_filing.body.submitted_at.is_some());
        assert_eq!(out.processing_steps.first().map(String::as_str), Some("Tax filing created"));
        assert_eq!(out.tax_filing.body.history.len(), 1);
        assert_eq!(store.count(Collection::TaxFilings, &Key::user(user)), 1);
    }

    #[tokio::test]
    async fn resubmission_replaces_collection_rows() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "individual",
                "assetDetails": {"propertyAssets": [{"cost": 5000000}, {"cost": 100}]}
            })))
            .await
            .unwrap();
        writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "individual",
                "assetDetails": {"propertyAssets": [{"cost": 7000000}]}
            })))
            .await
            .unwrap();

        assert_eq!(costs(&store, user), vec![7000000]);
        assert_eq!(store.count(Collection::TaxFilings, &Key::user(user)), 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_share_one_filing() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();
        let body = |cost: i64| {
            req(json!({
                "taxYear": "2024", "filingType": "individual",
                "assetDetails": {"propertyAssets": [{"cost": cost}]}
            }))
        };

        let (a, b) = tokio::join!(writer.submit(user, body(1)), writer.submit(user, body(2)));
        a.unwrap();
        b.unwrap();

        assert_eq!(store.count(Collection::TaxFilings, &Key::user(user)), 1);
        assert_eq!(costs(&store, user).len(), 1);
    }

    #[tokio::test]
    async fn submission_waits_for_open_exclusive_transaction() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        let mut held = store.begin_exclusive().await;
        held.insert(
            Collection::TaxFilings,
            Key::user_year(user, &year()),
            &TaxFiling::open(taxfile_core::FilingType::Individual),
        )
        .unwrap();

        let pending = tokio::spawn({
            let writer = writer.clone();
            async move {
                writer
                    .submit(user, req(json!({"taxYear": "2024", "filingType": "individual"})))
                    .await
            }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        held.commit().await.unwrap();
        let outcome = pending.await.unwrap().unwrap();
        assert_eq!(outcome.processing_steps[0], "Tax filing updated");
        assert_eq!(store.count(Collection::TaxFilings, &Key::user(user)), 1);
    }

    #[tokio::test]
    async fn absent_sections_keep_prior_rows() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "individual",
                "assetDetails": {"propertyAssets": [{"cost": 10}]},
                "expenses": {"rent": 5}
            })))
            .await
            .unwrap();
        writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "individual",
                "expenses": {"rent": 9}
            })))
            .await
            .unwrap();

        assert_eq!(costs(&store, user), vec![10]);
        let expenses = store.find(Collection::Expenses, &Key::user_year(user, &year()));
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].body["rent"], 9);
    }

    #[tokio::test]
    async fn terms_accepted_completes_and_closes_filing() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        let out = writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "salaried",
                "wrapUp": {"termsAccepted": true, "declarationName": "Ali Raza"}
            })))
            .await
            .unwrap();
        assert_eq!(out.tax_filing.body.status, FilingStatus::Completed);
        assert!(out.tax_filing.body.completed_at.is_some());

        let before = store.find(Collection::TaxFilings, &Key::default());
        let err = writer
            .submit(user, req(json!({
                "taxYear": "2024", "filingType": "salaried",
                "expenses": {"rent": 1}
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, FilingError::AlreadyCompleted { .. }));
        assert_eq!(store.find(Collection::TaxFilings, &Key::default()), before);
        assert!(store.list(Collection::Expenses).is_empty());
    }

    #[tokio::test]
    async fn missing_header_touches_nothing() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let err = writer
            .submit(UserId::new(), req(json!({"filingType": "individual", "expenses": {"rent": 1}})))
            .await
            .unwrap_err();
        assert!(matches!(err, FilingError::MissingField("taxYear")));
        assert!(store.list(Collection::TaxFilings).is_empty());
        assert!(store.list(Collection::Expenses).is_empty());
    }

    #[tokio::test]
    async fn unknown_service_aborts_whole_submission() {
        let store = DocumentStore::in_memory();
        seed_price(&store, "salaried_filing", 2500, true).await;
        seed_price(&store, "retired", 100, false).await;
        let writer = FilingWriter::new(store.clone());
        let user = UserId::new();

        for service in ["nonexistent", "retired"] {
            let err = writer
                .submit(user, req(json!({
                    "taxYear": "2024", "filingType": "individual",
                    "personalInfo": {"fullName": "Ali Raza", "cnic": "3520212345671"},
                    "cart": {"items": [{"serviceType": service}]}
                })))
                .await
                .unwrap_err();
            assert!(matches!(err, FilingError::UnknownService(_)));
        }
        assert!(store.list(Collection::TaxFilings).is_empty());
        assert!(store.list(Collection::PersonalInfo).is_empty());
        assert!(store.list(Collection::CartItems).is_empty());
    }

    #[tokio::test]
    async fn cart_is_priced_and_checkout_recorded() {
        let store = DocumentStore::in_memory();
        seed_price(&store, "salaried_filing", 2500, true).await;
        let writer = FilingWriter::new(store.clone());

        let out = writer
            .submit(UserId::new(), req(json!({
                "taxYear": "2024", "filingType": "salaried",
                "cart": {"items": [{"serviceType": "salaried_filing", "quantity": 2, "unitPrice": 1}]},
                "checkout": {"paymentMethod": "jazzcash", "transactionReference": "JC-991"}
            })))
            .await
            .unwrap();

        assert_eq!(out.cart.total, taxfile_core::Money::from_rupees(5000));
        assert_eq!(out.summary.cart_total, out.cart.total);
        let payment = out.checkout.unwrap();
        assert_eq!(payment.method, PaymentMethod::Jazzcash);
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.amount, taxfile_core::Money::from_rupees(5000));
        assert!(payment.paid_at.is_some());
        assert_eq!(out.saved_data["cart"]["items"][0]["unitPrice"], 2500);
    }

    #[tokio::test]
    async fn checkout_without_reference_is_pending() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store);
        let out = writer
            .submit(UserId::new(), req(json!({
                "taxYear": "2024", "filingType": "business",
                "checkout": {"paymentMethod": "card"}
            })))
            .await
            .unwrap();
        let payment = out.checkout.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.amount.is_zero());
        assert!(payment.paid_at.is_none());
    }

    #[tokio::test]
    async fn personal_info_is_keyed_by_filing() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store.clone());
        let out = writer
            .submit(UserId::new(), req(json!({
                "taxYear": "2024", "filingType": "individual",
                "personalInfo": {"fullName": "Ali Raza", "cnic": "35202-1234567-1"}
            })))
            .await
            .unwrap();
        let info = store.find(
            Collection::PersonalInfo,
            &Key::filing(out.tax_filing.as_filing_id()),
        );
        assert_eq!(info.len(), 1);
        assert_eq!(out.saved_data["personalInfo"]["fullName"], "Ali Raza");
    }

    #[tokio::test]
    async fn saved_data_nests_categories() {
        let store = DocumentStore::in_memory();
        let writer = FilingWriter::new(store);
        let out = writer
            .submit(UserId::new(), req(json!({
                "taxYear": "2024", "filingType": "individual",
                "incomeDetails": {"salaryIncome": {"annualSalary": 1200000}},
                "deductions": {"zakat": [{"amount": 100}, {"amount": 200}]}
            })))
            .await
            .unwrap();
        assert_eq!(out.saved_data["incomeDetails"]["salaryIncome"]["annualSalary"], 1200000);
        assert_eq!(out.saved_data["deductions"]["zakat"].as_array().unwrap().len(), 2);
        assert_eq!(out.summary.total_income, taxfile_core::Money::from_rupees(1_200_000));
        assert!(out.processing_steps.contains(&"Zakat saved".to_string()));
    }
}
