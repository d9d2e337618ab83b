//! # Write Plan
//!
//! A submission is turned into an ordered list of [`PlanEntry`] values,
//! one per present section (or category within a section). The writer
//! processes them uniformly through the two generic store operations.
//! Adding a section means adding an entry here.

use serde_json::Value;
use taxfile_core::sections::{CartItem, LineItem, SectionRecord};
use taxfile_core::Collection;

use crate::error::FilingError;
use crate::request::SubmitRequest;

/// How an entry is written, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionWrite {
    /// Overwrite the singleton under the key, or create it.
    Upsert(Value),
    /// Delete every row under the key, then insert these.
    ReplaceAll(Vec<Value>),
}

/// One step of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    /// Payload key of the section (`"assetDetails"`).
    pub section: &'static str,
    /// Category within the section (`"propertyAssets"`), if any.
    pub field: Option<&'static str>,
    /// Human-readable name logged in `processingSteps`.
    pub label: &'static str,
    pub collection: Collection,
    pub write: SectionWrite,
}

fn encode<T: serde::Serialize>(section: &'static str, value: &T) -> Result<Value, FilingError> {
    serde_json::to_value(value).map_err(|source| FilingError::Codec { section, source })
}

fn upsert<T: SectionRecord>(
    section: &'static str,
    field: Option<&'static str>,
    label: &'static str,
    record: &T,
) -> Result<PlanEntry, FilingError> {
    Ok(PlanEntry {
        section,
        field,
        label,
        collection: T::COLLECTION,
        write: SectionWrite::Upsert(encode(section, record)?),
    })
}

fn replace<T: SectionRecord>(
    section: &'static str,
    field: Option<&'static str>,
    label: &'static str,
    rows: &[T],
) -> Result<PlanEntry, FilingError> {
    Ok(PlanEntry {
        section,
        field,
        label,
        collection: T::COLLECTION,
        write: SectionWrite::ReplaceAll(
            rows.iter()
                .map(|r| encode(section, r))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Ordered write plan for one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    entries: Vec<PlanEntry>,
}

impl Plan {
    /// Build the plan for every present section of `req`. `cart` is the
    /// priced cart, when the request carries one.
    pub fn build(req: &SubmitRequest, cart: Option<&[CartItem]>) -> Result<Self, FilingError> {
        let mut plan = Plan::default();

        if let Some(v) = &req.personal_info {
            plan.push(upsert("personalInfo", None, "Personal information", v)?);
        }
        if let Some(v) = &req.income_sources {
            plan.push(upsert("incomeSources", None, "Income sources", v)?);
        }
        if let Some(d) = &req.income_details {
            const S: &str = "incomeDetails";
            if let Some(v) = &d.salary_income {
                plan.push(upsert(S, Some("salaryIncome"), "Salary income", v)?);
            }
            if let Some(v) = &d.business_income {
                plan.push(upsert(S, Some("businessIncome"), "Business income", v)?);
            }
            if let Some(v) = &d.rental_income {
                plan.push(upsert(S, Some("rentalIncome"), "Rental income", v)?);
            }
            if let Some(v) = &d.commission_income {
                plan.push(upsert(S, Some("commissionIncome"), "Commission income", v)?);
            }
            if let Some(v) = &d.dividend_income {
                plan.push(upsert(S, Some("dividendIncome"), "Dividend income", v)?);
            }
            if let Some(v) = &d.capital_gains {
                plan.push(upsert(S, Some("capitalGains"), "Capital gains", v)?);
            }
            if let Some(v) = &d.other_income {
                plan.push(upsert(S, Some("otherIncome"), "Other income", v)?);
            }
        }
        if let Some(v) = &req.tax_credits {
            plan.push(upsert("taxCredits", None, "Tax credits", v)?);
        }
        if let Some(v) = &req.opening_wealth {
            plan.push(upsert("openingWealth", None, "Opening wealth", v)?);
        }
        if let Some(v) = &req.asset_selection {
            plan.push(upsert("assetSelection", None, "Asset selection", v)?);
        }
        if let Some(d) = &req.asset_details {
            const S: &str = "assetDetails";
            plan.push_rows(S, "propertyAssets", "Property assets", d.property_assets.as_deref())?;
            plan.push_rows(S, "vehicleAssets", "Vehicle assets", d.vehicle_assets.as_deref())?;
            plan.push_rows(S, "bankAccounts", "Bank accounts", d.bank_accounts.as_deref())?;
            plan.push_rows(S, "investments", "Investments", d.investments.as_deref())?;
            plan.push_rows(S, "valuables", "Valuables", d.valuables.as_deref())?;
            plan.push_rows(S, "otherAssets", "Other assets", d.other_assets.as_deref())?;
            if let Some(v) = &d.cash_balance {
                plan.push(upsert(S, Some("cashBalance"), "Cash balance", v)?);
            }
        }
        if let Some(d) = &req.deductions {
            const S: &str = "deductions";
            plan.push_rows(S, "zakat", "Zakat", d.zakat.as_deref())?;
            plan.push_rows(S, "educationExpenses", "Education expenses", d.education_expenses.as_deref())?;
            plan.push_rows(S, "workersWelfareFund", "Workers' welfare fund", d.workers_welfare_fund.as_deref())?;
            plan.push_rows(S, "otherDeductions", "Other deductions", d.other_deductions.as_deref())?;
        }
        if let Some(d) = &req.liabilities {
            const S: &str = "liabilities";
            plan.push_rows(S, "bankLoans", "Bank loans", d.bank_loans.as_deref())?;
            plan.push_rows(S, "otherLiabilities", "Other liabilities", d.other_liabilities.as_deref())?;
        }
        if let Some(v) = &req.expenses {
            plan.push(upsert("expenses", None, "Expenses", v)?);
        }
        if let Some(v) = &req.wrap_up {
            plan.push(upsert("wrapUp", None, "Declaration", v)?);
        }
        if let Some(items) = cart {
            plan.push(replace("cart", Some("items"), "Cart", items)?);
        }

        Ok(plan)
    }

    fn push(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }

    fn push_rows<T: LineItem>(
        &mut self,
        section: &'static str,
        field: &'static str,
        label: &'static str,
        rows: Option<&[T]>,
    ) -> Result<(), FilingError> {
        if let Some(rows) = rows {
            self.push(replace(section, Some(field), label, rows)?);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(v: Value) -> Plan {
        let req: SubmitRequest = serde_json::from_value(v).unwrap();
        Plan::build(&req, None).unwrap()
    }

    #[test]
    fn header_only_request_has_empty_plan() {
        assert!(plan(json!({"taxYear": "2024", "filingType": "individual"})).is_empty());
    }

    #[test]
    fn entries_follow_wizard_order() {
        let p = plan(json!({
            "wrapUp": {"termsAccepted": true},
            "expenses": {"rent": 1},
            "personalInfo": {"fullName": "Ali", "cnic": "3520212345671"},
            "incomeDetails": {"rentalIncome": {"annualRent": 10}, "salaryIncome": {}}
        }));
        let collections: Vec<_> = p.entries().iter().map(|e| e.collection).collect();
        assert_eq!(
            collections,
            vec![
                Collection::PersonalInfo,
                Collection::SalaryIncome,
                Collection::RentalIncome,
                Collection::Expenses,
                Collection::Finalization,
            ]
        );
    }

    #[test]
    fn list_categories_replace_and_singletons_upsert() {
        let p = plan(json!({
            "assetDetails": {
                "propertyAssets": [{"cost": 5000000}],
                "cashBalance": {"amount": 100}
            }
        }));
        assert_eq!(p.entries().len(), 2);
        assert!(matches!(&p.entries()[0].write, SectionWrite::ReplaceAll(rows) if rows.len() == 1));
        assert_eq!(p.entries()[0].field, Some("propertyAssets"));
        assert!(matches!(p.entries()[1].write, SectionWrite::Upsert(_)));
        assert_eq!(p.entries()[1].collection, Collection::CashBalance);
    }

    #[test]
    fn empty_list_is_kept_as_clear() {
        let p = plan(json!({"liabilities": {"bankLoans": []}}));
        assert_eq!(p.entries().len(), 1);
        assert_eq!(p.entries()[0].write, SectionWrite::ReplaceAll(vec![]));
    }

    #[test]
    fn priced_cart_becomes_replace_entry() {
        let req: SubmitRequest = serde_json::from_value(json!({"cart": {"items": []}})).unwrap();
        let items: Vec<CartItem> =
            vec![serde_json::from_value(json!({"serviceType": "salaried_filing"})).unwrap()];
        let p = Plan::build(&req, Some(&items)).unwrap();
        assert_eq!(p.entries()[0].collection, Collection::CartItems);
    }
}
