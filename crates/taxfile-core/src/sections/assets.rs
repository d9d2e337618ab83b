//! Asset categories. Every category except cash is a list replaced
//! wholesale on each submission.

use serde::{Deserialize, Serialize};

use super::{LineItem, SectionRecord};
use crate::collection::Collection;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_LONG_TEXT, MAX_SHORT_TEXT};

/// Immovable property (house, plot, shop).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyAsset {
    pub property_type: Option<String>,
    pub address: Option<String>,
    pub cost: Money,
    pub acquisition_date: Option<chrono::NaiveDate>,
}

/// Motor vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleAsset {
    pub make: Option<String>,
    pub model: Option<String>,
    pub registration_number: Option<String>,
    pub cost: Money,
}

/// Balance held in a bank account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankAccount {
    pub bank_name: Option<String>,
    pub account_title: Option<String>,
    pub balance: Money,
}

/// Shares, certificates, mutual funds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvestmentAsset {
    pub investment_type: Option<String>,
    pub description: Option<String>,
    pub cost: Money,
}

/// Jewellery and other valuables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuableAsset {
    pub description: Option<String>,
    pub value: Money,
}

/// Any other declared asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherAsset {
    pub description: Option<String>,
    pub value: Money,
}

/// Cash in hand. Singleton, upserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashBalance {
    pub amount: Money,
    pub notes: Option<String>,
}

impl Validate for PropertyAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.propertyAssets.propertyType", self.property_type.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("assetDetails.propertyAssets.address", self.address.as_deref(), MAX_LONG_TEXT)
    }
}

impl Validate for VehicleAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.vehicleAssets.make", self.make.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("assetDetails.vehicleAssets.model", self.model.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len(
            "assetDetails.vehicleAssets.registrationNumber",
            self.registration_number.as_deref(),
            MAX_SHORT_TEXT,
        )
    }
}

impl Validate for BankAccount {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.bankAccounts.bankName", self.bank_name.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("assetDetails.bankAccounts.accountTitle", self.account_title.as_deref(), MAX_SHORT_TEXT)
    }
}

impl Validate for InvestmentAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.investments.investmentType", self.investment_type.as_deref(), MAX_SHORT_TEXT)?;
        validation::opt_max_len("assetDetails.investments.description", self.description.as_deref(), MAX_LONG_TEXT)
    }
}

impl Validate for ValuableAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.valuables.description", self.description.as_deref(), MAX_LONG_TEXT)
    }
}

impl Validate for OtherAsset {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.otherAssets.description", self.description.as_deref(), MAX_LONG_TEXT)
    }
}

impl Validate for CashBalance {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::opt_max_len("assetDetails.cashBalance.notes", self.notes.as_deref(), MAX_LONG_TEXT)
    }
}

impl SectionRecord for CashBalance {
    const COLLECTION: Collection = Collection::CashBalance;
}

macro_rules! asset_line {
    ($ty:ty, $collection:ident, $field:ident) => {
        impl SectionRecord for $ty {
            const COLLECTION: Collection = Collection::$collection;
        }

        impl LineItem for $ty {
            fn amount(&self) -> Money {
                self.$field
            }
        }
    };
}

asset_line!(PropertyAsset, PropertyAssets, cost);
asset_line!(VehicleAsset, VehicleAssets, cost);
asset_line!(BankAccount, BankAccounts, balance);
asset_line!(InvestmentAsset, InvestmentAssets, cost);
asset_line!(ValuableAsset, ValuableAssets, value);
asset_line!(OtherAsset, OtherAssets, value);

/// Asset details step payload.
///
/// `Some(vec![])` clears a category; `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetDetails {
    pub property_assets: Option<Vec<PropertyAsset>>,
    pub vehicle_assets: Option<Vec<VehicleAsset>>,
    pub bank_accounts: Option<Vec<BankAccount>>,
    pub investments: Option<Vec<InvestmentAsset>>,
    pub valuables: Option<Vec<ValuableAsset>>,
    pub other_assets: Option<Vec<OtherAsset>>,
    pub cash_balance: Option<CashBalance>,
}

impl Validate for AssetDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        self.property_assets.validate()?;
        self.vehicle_assets.validate()?;
        self.bank_accounts.validate()?;
        self.investments.validate()?;
        self.valuables.validate()?;
        self.other_assets.validate()?;
        self.cash_balance.validate()
    }
}
