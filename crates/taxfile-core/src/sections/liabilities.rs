use serde::{Deserialize, Serialize};

use super::{LineItem, SectionRecord};
use crate::collection::Collection;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_LONG_TEXT, MAX_SHORT_TEXT};

/// Outstanding loan from a bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankLoan {
    pub bank_name: Option<String>,
    pub loan_type: Option<String>,
    pub outstanding_amount: Money,
}

/// Any other outstanding liability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherLiability {
    pub description: Option<String>,
    pub amount: Money,
}

impl Validate for BankLoan {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("liabilities.bankLoans.bankName", self.bank_name.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("liabilities.bankLoans.loanType", self.loan_type.as_deref(), MAX_SHORT_TEXT)
    }
}

impl Validate for OtherLiability {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "liabilities.otherLiabilities.description",
            self.description.as_deref(),
            MAX_LONG_TEXT,
        )
    }
}

impl SectionRecord for BankLoan {
    const COLLECTION: Collection = Collection::BankLoans;
}

impl LineItem for BankLoan {
    fn amount(&self) -> Money {
        self.outstanding_amount
    }
}

impl SectionRecord for OtherLiability {
    const COLLECTION: Collection = Collection::OtherLiabilities;
}

impl LineItem for OtherLiability {
    fn amount(&self) -> Money {
        self.amount
    }
}

/// Liabilities step payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Liabilities {
    pub bank_loans: Option<Vec<BankLoan>>,
    pub other_liabilities: Option<Vec<OtherLiability>>,
}

impl Validate for Liabilities {
    fn validate(&self) -> Result<(), ValidationError> {
        self.bank_loans.validate()?;
        self.other_liabilities.validate()
    }
}
