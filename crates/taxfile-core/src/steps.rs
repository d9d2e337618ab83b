//! # Step Completion Evaluator
//!
//! The wizard has twelve fixed steps. Each step is complete or not
//! according to one check:
//!
//! - `tax_filing`: the filing itself exists.
//! - `multiple`: any of several collections holds a record.
//! - `single`: one collection holds a record.
//!
//! Steps may be completed in any order. The current step is the first
//! incomplete one; nothing about progress is persisted.
//!
//! The evaluator is pure: callers supply a [`StepProbe`] that answers
//! record counts, typically backed by the document store.

use serde::Serialize;

use crate::collection::Collection;
use crate::filing::FilingStatus;

/// Number of wizard steps.
pub const TOTAL_STEPS: usize = 12;

/// Wizard route shown once every step is complete.
pub const CART_PATH: &str = "/tax-filing/cart";

/// Share of completed steps (numerator, denominator) required before the
/// filer may submit. Business policy, not derived from anything else.
pub const SUBMIT_THRESHOLD: (usize, usize) = (4, 5);

/// How a step decides whether it is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCheck {
    TaxFiling,
    Multiple(&'static [Collection]),
    Single(Collection),
}

/// Wire label of a [`StepCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    TaxFiling,
    Multiple,
    Single,
}

impl StepCheck {
    pub fn check_type(&self) -> CheckType {
        match self {
            Self::TaxFiling => CheckType::TaxFiling,
            Self::Multiple(_) => CheckType::Multiple,
            Self::Single(_) => CheckType::Single,
        }
    }

    /// Collections this check consults.
    pub fn collections(&self) -> &[Collection] {
        match self {
            Self::TaxFiling => &[Collection::TaxFilings],
            Self::Multiple(cs) => cs,
            Self::Single(c) => std::slice::from_ref(c),
        }
    }
}

/// Static description of one wizard step.
#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub order: u8,
    pub check: StepCheck,
    pub path: &'static str,
}

const INCOME_COLLECTIONS: &[Collection] = &[
    Collection::SalaryIncome,
    Collection::BusinessIncome,
    Collection::RentalIncome,
    Collection::CommissionIncome,
    Collection::DividendIncome,
    Collection::CapitalGainIncome,
    Collection::OtherIncome,
];

const DEDUCTION_COLLECTIONS: &[Collection] = &[
    Collection::ZakatDeductions,
    Collection::EducationDeductions,
    Collection::WelfareFundDeductions,
    Collection::OtherDeductions,
];

const ASSET_COLLECTIONS: &[Collection] = &[
    Collection::PropertyAssets,
    Collection::VehicleAssets,
    Collection::BankAccounts,
    Collection::InvestmentAssets,
    Collection::ValuableAssets,
    Collection::OtherAssets,
    Collection::CashBalance,
];

const LIABILITY_COLLECTIONS: &[Collection] =
    &[Collection::BankLoans, Collection::OtherLiabilities];

/// The wizard, in order.
pub const STEPS: [StepDefinition; TOTAL_STEPS] = [
    StepDefinition { id: "tax_year", name: "Tax Year", order: 1, check: StepCheck::TaxFiling, path: "/tax-filing/tax-year" },
    StepDefinition { id: "personal_info", name: "Personal Information", order: 2, check: StepCheck::Single(Collection::PersonalInfo), path: "/tax-filing/personal-info" },
    StepDefinition { id: "income_sources", name: "Income Sources", order: 3, check: StepCheck::Single(Collection::IncomeSources), path: "/tax-filing/income-sources" },
    StepDefinition { id: "income_details", name: "Income Details", order: 4, check: StepCheck::Multiple(INCOME_COLLECTIONS), path: "/tax-filing/income-details" },
    StepDefinition { id: "tax_credits", name: "Tax Credits", order: 5, check: StepCheck::Single(Collection::TaxCredits), path: "/tax-filing/tax-credits" },
    StepDefinition { id: "deductions", name: "Deductions", order: 6, check: StepCheck::Multiple(DEDUCTION_COLLECTIONS), path: "/tax-filing/deductions" },
    StepDefinition { id: "opening_wealth", name: "Opening Wealth", order: 7, check: StepCheck::Single(Collection::OpeningWealth), path: "/tax-filing/opening-wealth" },
    StepDefinition { id: "asset_selection", name: "Asset Selection", order: 8, check: StepCheck::Single(Collection::AssetSelection), path: "/tax-filing/asset-selection" },
    StepDefinition { id: "asset_details", name: "Asset Details", order: 9, check: StepCheck::Multiple(ASSET_COLLECTIONS), path: "/tax-filing/asset-details" },
    StepDefinition { id: "liabilities", name: "Liabilities", order: 10, check: StepCheck::Multiple(LIABILITY_COLLECTIONS), path: "/tax-filing/liabilities" },
    StepDefinition { id: "expenses", name: "Expenses", order: 11, check: StepCheck::Single(Collection::Expenses), path: "/tax-filing/expenses" },
    StepDefinition { id: "wrap_up", name: "Wrap Up", order: 12, check: StepCheck::Single(Collection::Finalization), path: "/tax-filing/wrap-up" },
];

/// Answers the questions the evaluator asks.
pub trait StepProbe {
    /// Status of the filing, `None` when there is no filing.
    fn filing_status(&self) -> Option<FilingStatus>;

    /// Number of records in `collection` visible to this probe.
    fn count(&self, collection: Collection) -> usize;
}

/// Evaluated state of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub order: u8,
    pub check_type: CheckType,
    pub path: &'static str,
    pub completed: bool,
}

/// Evaluated wizard progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub steps: Vec<StepStatus>,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub completion_percentage: u8,
    pub current_step: Option<StepStatus>,
    pub can_submit: bool,
    pub filing_status: Option<FilingStatus>,
}

impl Progress {
    /// Wizard route to resume at: the current step, or the cart when done.
    pub fn resume_path(&self) -> &'static str {
        self.current_step.as_ref().map_or(CART_PATH, |s| s.path)
    }
}

/// `round(100 * completed / total)`, half rounding up.
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let pct = (200 * completed + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}

/// Whether `completed` of `total` steps clears [`SUBMIT_THRESHOLD`].
pub fn can_submit(completed: usize, total: usize) -> bool {
    let (num, den) = SUBMIT_THRESHOLD;
    completed * den >= total * num
}

fn step_complete(check: &StepCheck, probe: &impl StepProbe) -> bool {
    match check {
        StepCheck::TaxFiling => probe.filing_status().is_some(),
        StepCheck::Multiple(cs) => cs.iter().any(|c| probe.count(*c) > 0),
        StepCheck::Single(c) => probe.count(*c) > 0,
    }
}

/// Evaluate every step against `probe`.
pub fn evaluate(probe: &impl StepProbe) -> Progress {
    let steps: Vec<StepStatus> = STEPS
        .iter()
        .map(|def| StepStatus {
            id: def.id,
            name: def.name,
            order: def.order,
            check_type: def.check.check_type(),
            path: def.path,
            completed: step_complete(&def.check, probe),
        })
        .collect();

    let completed_steps = steps.iter().filter(|s| s.completed).count();
    let current_step = steps.iter().find(|s| !s.completed).cloned();

    Progress {
        completed_steps,
        total_steps: TOTAL_STEPS,
        completion_percentage: completion_percentage(completed_steps, TOTAL_STEPS),
        current_step,
        can_submit: can_submit(completed_steps, TOTAL_STEPS),
        filing_status: probe.filing_status(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeProbe {
        status: Option<FilingStatus>,
        counts: HashMap<Collection, usize>,
    }

    impl FakeProbe {
        fn with(mut self, c: Collection) -> Self {
            *self.counts.entry(c).or_default() += 1;
            self
        }
    }

    impl StepProbe for FakeProbe {
        fn filing_status(&self) -> Option<FilingStatus> {
            self.status
        }

        fn count(&self, collection: Collection) -> usize {
            self.counts.get(&collection).copied().unwrap_or(0)
        }
    }

    #[test]
    fn steps_are_ordered_one_to_twelve() {
        for (i, s) in STEPS.iter().enumerate() {
            assert_eq!(usize::from(s.order), i + 1);
        }
    }

    #[test]
    fn empty_probe_starts_at_tax_year() {
        let p = evaluate(&FakeProbe::default());
        assert_eq!(p.completed_steps, 0);
        assert_eq!(p.completion_percentage, 0);
        assert_eq!(p.current_step.as_ref().map(|s| s.id), Some("tax_year"));
        assert!(!p.can_submit);
        assert_eq!(p.resume_path(), "/tax-filing/tax-year");
    }

    #[test]
    fn filing_and_personal_info_is_seventeen_percent() {
        let probe = FakeProbe {
            status: Some(FilingStatus::Processing),
            ..Default::default()
        }
        .with(Collection::PersonalInfo);
        let p = evaluate(&probe);
        assert_eq!(p.completed_steps, 2);
        assert_eq!(p.completion_percentage, 17);
        assert_eq!(p.current_step.as_ref().map(|s| s.id), Some("income_sources"));
    }

    #[test]
    fn any_income_category_completes_income_details() {
        let p = evaluate(&FakeProbe::default().with(Collection::DividendIncome));
        let step = p.steps.iter().find(|s| s.id == "income_details").unwrap();
        assert!(step.completed);
        assert_eq!(step.check_type, CheckType::Multiple);
    }

    #[test]
    fn cash_balance_alone_completes_asset_details() {
        let p = evaluate(&FakeProbe::default().with(Collection::CashBalance));
        assert!(p.steps.iter().find(|s| s.id == "asset_details").unwrap().completed);
    }

    #[test]
    fn all_complete_resumes_at_cart() {
        let mut probe = FakeProbe {
            status: Some(FilingStatus::UnderReview),
            ..Default::default()
        };
        for def in &STEPS {
            for c in def.check.collections() {
                probe = probe.with(*c);
            }
        }
        let p = evaluate(&probe);
        assert_eq!(p.completed_steps, 12);
        assert_eq!(p.completion_percentage, 100);
        assert!(p.current_step.is_none());
        assert!(p.can_submit);
        assert_eq!(p.resume_path(), CART_PATH);
    }

    #[test]
    fn threshold_is_ten_of_twelve() {
        assert!(!can_submit(9, 12));
        assert!(can_submit(10, 12));
    }

    proptest! {
        #[test]
        fn percentage_matches_float_rounding(completed in 0usize..=12) {
            let expected = (100.0 * completed as f64 / 12.0).round() as u8;
            prop_assert_eq!(completion_percentage(completed, 12), expected);
        }

        #[test]
        fn percentage_is_monotonic(a in 0usize..=12, b in 0usize..=12) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(completion_percentage(lo, 12) <= completion_percentage(hi, 12));
        }

        #[test]
        fn can_submit_matches_eighty_percent(completed in 0usize..=12) {
            prop_assert_eq!(can_submit(completed, 12), completed as f64 >= 0.8 * 12.0);
        }
    }
}
