//! Deduction categories (replace-all lists).

use serde::{Deserialize, Serialize};

use super::{LineItem, SectionRecord};
use crate::collection::Collection;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_LONG_TEXT, MAX_SHORT_TEXT};

/// Zakat deducted under the Zakat and Ushr Ordinance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZakatDeduction {
    pub amount: Money,
    pub certificate_number: Option<String>,
}

/// Children's tuition fee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationDeduction {
    pub institution: Option<String>,
    pub child_name: Option<String>,
    pub amount: Money,
}

/// Workers' Welfare Fund contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WelfareFundDeduction {
    pub amount: Money,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherDeduction {
    pub description: Option<String>,
    pub amount: Money,
}

impl Validate for ZakatDeduction {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "deductions.zakat.certificateNumber",
            self.certificate_number.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

impl Validate for EducationDeduction {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "deductions.educationExpenses.institution",
            self.institution.as_deref(),
            MAX_SHORT_TEXT,
        )?;
        validation::opt_max_len(
            "deductions.educationExpenses.childName",
            self.child_name.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

impl Validate for WelfareFundDeduction {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "deductions.workersWelfareFund.reference",
            self.reference.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

impl Validate for OtherDeduction {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "deductions.otherDeductions.description",
            self.description.as_deref(),
            MAX_LONG_TEXT,
        )
    }
}

macro_rules! deduction_line {
    ($ty:ty, $collection:ident) => {
        impl SectionRecord for $ty {
            const COLLECTION: Collection = Collection::$collection;
        }

        impl LineItem for $ty {
            fn amount(&self) -> Money {
                self.amount
            }
        }
    };
}

deduction_line!(ZakatDeduction, ZakatDeductions);
deduction_line!(EducationDeduction, EducationDeductions);
deduction_line!(WelfareFundDeduction, WelfareFundDeductions);
deduction_line!(OtherDeduction, OtherDeductions);

/// Deductions step payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deductions {
    pub zakat: Option<Vec<ZakatDeduction>>,
    pub education_expenses: Option<Vec<EducationDeduction>>,
    pub workers_welfare_fund: Option<Vec<WelfareFundDeduction>>,
    pub other_deductions: Option<Vec<OtherDeduction>>,
}

impl Validate for Deductions {
    fn validate(&self) -> Result<(), ValidationError> {
        self.zakat.validate()?;
        self.education_expenses.validate()?;
        self.workers_welfare_fund.validate()?;
        self.other_deductions.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::total;

    #[test]
    fn deductions_parse_and_total() {
        let d: Deductions = serde_json::from_value(serde_json::json!({
            "zakat": [{"amount": 25000}, {"amount": 5000}],
            "otherDeductions": []
        }))
        .unwrap();
        assert_eq!(total(&d.zakat.unwrap()), Money::from_rupees(30_000));
        assert_eq!(d.other_deductions, Some(vec![]));
        assert!(d.education_expenses.is_none());
    }
}
