//! The comprehensive submission request body.

use serde::{Deserialize, Serialize};
use taxfile_core::sections::{
    AssetDetails, AssetSelection, Cart, Checkout, Deductions, Expenses, IncomeDetails,
    IncomeSources, Liabilities, OpeningWealth, PersonalInfo, TaxCredits, WrapUp,
};
use taxfile_core::{FilingType, TaxYear, Validate, ValidationError};

use crate::error::FilingError;

/// Sparse wizard payload. Every section is optional and processed only if
/// present; `taxYear` and `filingType` are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitRequest {
    pub tax_year: Option<String>,
    pub filing_type: Option<String>,
    pub personal_info: Option<PersonalInfo>,
    pub income_sources: Option<IncomeSources>,
    pub income_details: Option<IncomeDetails>,
    pub tax_credits: Option<TaxCredits>,
    pub opening_wealth: Option<OpeningWealth>,
    pub asset_selection: Option<AssetSelection>,
    pub asset_details: Option<AssetDetails>,
    pub deductions: Option<Deductions>,
    pub liabilities: Option<Liabilities>,
    pub expenses: Option<Expenses>,
    pub wrap_up: Option<WrapUp>,
    pub cart: Option<Cart>,
    pub checkout: Option<Checkout>,
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, FilingError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FilingError::MissingField(field)),
    }
}

impl SubmitRequest {
    /// Parse the required header fields.
    pub fn header(&self) -> Result<(TaxYear, FilingType), FilingError> {
        let tax_year = required("taxYear", self.tax_year.as_deref())?;
        let filing_type = required("filingType", self.filing_type.as_deref())?;
        Ok((TaxYear::new(tax_year)?, filing_type.parse()?))
    }

    /// Whether the wrap-up section accepts the terms.
    pub fn terms_accepted(&self) -> bool {
        self.wrap_up.as_ref().is_some_and(|w| w.terms_accepted)
    }
}

impl Validate for SubmitRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.personal_info.validate()?;
        self.income_sources.validate()?;
        self.income_details.validate()?;
        self.tax_credits.validate()?;
        self.opening_wealth.validate()?;
        self.asset_selection.validate()?;
        self.asset_details.validate()?;
        self.deductions.validate()?;
        self.liabilities.validate()?;
        self.expenses.validate()?;
        self.wrap_up.validate()?;
        self.cart.validate()?;
        self.checkout.validate()
    }
}
