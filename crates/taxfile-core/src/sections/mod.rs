//! # Wizard Sections
//!
//! One DTO per wizard step. Each record type knows which collection it is
//! stored in; collection-valued records also expose the amount they
//! contribute to the filing summary.
//!
//! Wire names are camelCase. Monetary fields default to zero and reject
//! negative input at deserialization.

mod assets;
mod cart;
mod deductions;
mod income;
mod liabilities;

pub use assets::{
    AssetDetails, BankAccount, CashBalance, InvestmentAsset, OtherAsset, PropertyAsset,
    ValuableAsset, VehicleAsset,
};
pub use cart::{Cart, CartItem, Checkout};
pub use deductions::{
    Deductions, EducationDeduction, OtherDeduction, WelfareFundDeduction, ZakatDeduction,
};
pub use income::{
    BusinessIncome, CapitalGainIncome, CommissionIncome, DividendIncome, IncomeDetails,
    IncomeEntry, OtherIncome, RentalIncome, SalaryIncome,
};
pub use liabilities::{BankLoan, Liabilities, OtherLiability};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::ValidationError;
use crate::identity::Cnic;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_LONG_TEXT, MAX_SHORT_TEXT};

/// A record type stored in exactly one collection.
pub trait SectionRecord: Serialize + DeserializeOwned + Validate + Clone + Send + Sync {
    /// Where records of this type live.
    const COLLECTION: Collection;
}

/// A collection-valued record that contributes an amount to the summary.
pub trait LineItem: SectionRecord {
    /// The amount this row adds to its section total.
    fn amount(&self) -> Money;
}

/// Sum the amounts of a slice of line items.
pub fn total<T: LineItem>(items: &[T]) -> Money {
    Money::sum(items.iter().map(LineItem::amount))
}

// -- Personal info ------------------------------------------------------------

/// Tax residency of the filer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentialStatus {
    Resident,
    NonResident,
}

/// Identity and contact details, stored once per filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub cnic: Cnic,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub residential_status: Option<ResidentialStatus>,
}

impl Validate for PersonalInfo {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("personalInfo.fullName", &self.full_name)?;
        if let Some(email) = &self.email {
            validation::email("personalInfo.email", email)?;
        }
        if let Some(phone) = &self.phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            let allowed = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '));
            if !allowed || !(10..=15).contains(&digits) {
                return Err(ValidationError::Invalid {
                    field: "personalInfo.phone",
                    reason: format!("\"{phone}\" is not a valid phone number"),
                });
            }
        }
        validation::opt_max_len("personalInfo.address", self.address.as_deref(), MAX_LONG_TEXT)?;
        validation::opt_max_len("personalInfo.city", self.city.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len(
            "personalInfo.occupation",
            self.occupation.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

impl SectionRecord for PersonalInfo {
    const COLLECTION: Collection = Collection::PersonalInfo;
}

// -- Income sources -------------------------------------------------------------

/// Which income categories the filer declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeSources {
    pub salary: bool,
    pub business: bool,
    pub rental: bool,
    pub commission: bool,
    pub dividend: bool,
    pub capital_gains: bool,
    pub other: bool,
}

impl Validate for IncomeSources {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl SectionRecord for IncomeSources {
    const COLLECTION: Collection = Collection::IncomeSources;
}

// -- Tax credits ----------------------------------------------------------------

/// Amounts eligible for tax credit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxCredits {
    pub charitable_donations: Money,
    pub pension_contributions: Money,
    pub shares_investment: Money,
    pub insurance_premium: Money,
    pub other_credits: Money,
}

impl TaxCredits {
    pub fn total(&self) -> Money {
        Money::sum([
            self.charitable_donations,
            self.pension_contributions,
            self.shares_investment,
            self.insurance_premium,
            self.other_credits,
        ])
    }
}

impl Validate for TaxCredits {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl SectionRecord for TaxCredits {
    const COLLECTION: Collection = Collection::TaxCredits;
}

// -- Opening wealth -------------------------------------------------------------

/// Net wealth at the start of the tax year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpeningWealth {
    pub opening_net_wealth: Money,
    pub notes: Option<String>,
}

impl Validate for OpeningWealth {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("openingWealth.notes", self.notes.as_deref(), MAX_LONG_TEXT)
    }
}

impl SectionRecord for OpeningWealth {
    const COLLECTION: Collection = Collection::OpeningWealth;
}

// -- Asset selection ------------------------------------------------------------

/// Which asset categories the filer declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetSelection {
    pub property: bool,
    pub vehicles: bool,
    pub bank_accounts: bool,
    pub investments: bool,
    pub valuables: bool,
    pub cash: bool,
    pub other: bool,
}

impl Validate for AssetSelection {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl SectionRecord for AssetSelection {
    const COLLECTION: Collection = Collection::AssetSelection;
}

// -- Expenses -------------------------------------------------------------------

/// Annual personal and household expenses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expenses {
    pub rent: Money,
    pub utilities: Money,
    pub education: Money,
    pub medical: Money,
    pub travel: Money,
    pub vehicle_running: Money,
    pub household_other: Money,
}

impl Expenses {
    pub fn total(&self) -> Money {
        Money::sum([
            self.rent,
            self.utilities,
            self.education,
            self.medical,
            self.travel,
            self.vehicle_running,
            self.household_other,
        ])
    }
}

impl Validate for Expenses {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl SectionRecord for Expenses {
    const COLLECTION: Collection = Collection::Expenses;
}

// -- Wrap-up --------------------------------------------------------------------

/// Final declaration. `termsAccepted` completes the filing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrapUp {
    pub terms_accepted: bool,
    pub declaration_name: Option<String>,
    pub additional_notes: Option<String>,
}

impl Validate for WrapUp {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len(
            "wrapUp.declarationName",
            self.declaration_name.as_deref(),
            MAX_SHORT_TEXT,
        )?;
        validation::opt_max_len(
            "wrapUp.additionalNotes",
            self.additional_notes.as_deref(),
            MAX_LONG_TEXT,
        )
    }
}

impl SectionRecord for WrapUp {
    const COLLECTION: Collection = Collection::Finalization;
}
