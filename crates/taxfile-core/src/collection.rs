//! # Collection Catalogue
//!
//! Every entity store the service writes to, with its wire name and the
//! shape of the key its documents carry.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How documents in a collection are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyShape {
    /// `(userId, taxYear)`: wizard sections and the filing itself.
    UserYear,
    /// `(filingId)`: personal info.
    Filing,
    /// `(userId)` only: owner-scoped back-office records.
    Owner,
    /// No key: shared back-office records.
    Global,
}

macro_rules! collections {
    ($($variant:ident => $name:literal, $shape:ident;)+) => {
        /// A named entity store.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Collection {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Collection {
            /// Every collection, in catalogue order.
            pub const ALL: &'static [Collection] = &[$(Collection::$variant),+];

            /// Wire / table name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Key shape of documents in this collection.
            pub fn key_shape(&self) -> KeyShape {
                match self {
                    $(Self::$variant => KeyShape::$shape,)+
                }
            }
        }

        impl std::str::FromStr for Collection {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnsupportedValue {
                        field: "collection",
                        value: other.to_string(),
                        expected: concat!($($name, " "),+),
                    }),
                }
            }
        }
    };
}

collections! {
    TaxFilings => "tax_filings", UserYear;
    PersonalInfo => "personal_info", Filing;
    IncomeSources => "income_sources", UserYear;
    SalaryIncome => "salary_income", UserYear;
    BusinessIncome => "business_income", UserYear;
    RentalIncome => "rental_income", UserYear;
    CommissionIncome => "commission_income", UserYear;
    DividendIncome => "dividend_income", UserYear;
    CapitalGainIncome => "capital_gain_income", UserYear;
    OtherIncome => "other_income", UserYear;
    TaxCredits => "tax_credits", UserYear;
    OpeningWealth => "opening_wealth", UserYear;
    AssetSelection => "asset_selection", UserYear;
    PropertyAssets => "property_assets", UserYear;
    VehicleAssets => "vehicle_assets", UserYear;
    BankAccounts => "bank_accounts", UserYear;
    InvestmentAssets => "investment_assets", UserYear;
    ValuableAssets => "valuable_assets", UserYear;
    OtherAssets => "other_assets", UserYear;
    CashBalance => "cash_balance", UserYear;
    ZakatDeductions => "zakat_deductions", UserYear;
    EducationDeductions => "education_deductions", UserYear;
    WelfareFundDeductions => "welfare_fund_deductions", UserYear;
    OtherDeductions => "other_deductions", UserYear;
    BankLoans => "bank_loans", UserYear;
    OtherLiabilities => "other_liabilities", UserYear;
    Expenses => "expenses", UserYear;
    Finalization => "finalization", UserYear;
    CartItems => "cart_items", UserYear;
    ServiceCharges => "service_charges", Global;
    Accountants => "accountants", Global;
    Documents => "documents", Owner;
    GstRegistrations => "gst_registrations", Owner;
    NtnRegistrations => "ntn_registrations", Owner;
    Notifications => "notifications", Owner;
    Reports => "reports", Global;
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = Collection::ALL.iter().map(Collection::as_str).collect();
        assert_eq!(names.len(), Collection::ALL.len());
    }

    #[test]
    fn from_str_inverts_as_str() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().unwrap(), *c);
        }
        assert!("users".parse::<Collection>().is_err());
    }

    #[test]
    fn serde_name_matches_table_name() {
        for c in Collection::ALL {
            let json = serde_json::to_value(c).unwrap();
            assert_eq!(json, serde_json::Value::String(c.as_str().to_string()));
        }
    }

    #[test]
    fn personal_info_is_filing_keyed() {
        assert_eq!(Collection::PersonalInfo.key_shape(), KeyShape::Filing);
        assert_eq!(Collection::SalaryIncome.key_shape(), KeyShape::UserYear);
        assert_eq!(Collection::Documents.key_shape(), KeyShape::Owner);
        assert_eq!(Collection::ServiceCharges.key_shape(), KeyShape::Global);
    }
}
