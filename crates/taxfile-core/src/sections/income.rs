//! Income categories. Each category is a singleton per `(userId, taxYear)`.

use serde::{Deserialize, Serialize};

use super::SectionRecord;
use crate::collection::Collection;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{self, Validate, MAX_SHORT_TEXT};

/// An income category record.
pub trait IncomeEntry: SectionRecord {
    /// Taxable income this category contributes.
    fn gross_income(&self) -> Money;

    /// Tax already withheld at source.
    fn tax_deducted(&self) -> Money;
}

/// Employment income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalaryIncome {
    pub employer_name: Option<String>,
    pub employer_ntn: Option<String>,
    pub annual_salary: Money,
    pub allowances: Money,
    pub bonus: Money,
    pub tax_deducted: Money,
}

/// Sole-proprietor business income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessIncome {
    pub business_name: Option<String>,
    pub gross_revenue: Money,
    pub business_expenses: Money,
    pub tax_deducted: Money,
}

/// Income from letting property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalIncome {
    pub property_address: Option<String>,
    pub annual_rent: Money,
    pub tax_deducted: Money,
}

/// Commission and brokerage income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommissionIncome {
    pub source: Option<String>,
    pub amount: Money,
    pub tax_deducted: Money,
}

/// Dividends received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DividendIncome {
    pub company_name: Option<String>,
    pub amount: Money,
    pub tax_deducted: Money,
}

/// Gains on disposal of assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapitalGainIncome {
    pub asset_description: Option<String>,
    pub sale_proceeds: Money,
    pub cost_of_acquisition: Money,
    pub tax_deducted: Money,
}

/// Anything not covered above.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherIncome {
    pub description: Option<String>,
    pub amount: Money,
    pub tax_deducted: Money,
}

/// Net of a gross figure and its offset, floored at zero.
fn net(gross: Money, offset: Money) -> Money {
    gross.signed_sub(offset).max(Money::ZERO)
}

macro_rules! income_entry {
    ($ty:ty, $collection:ident, $text:ident, $field:literal, |$s:ident| $gross:expr) => {
        impl Validate for $ty {
            fn validate(&self) -> Result<(), ValidationError> {
                validation::opt_max_len($field, self.$text.as_deref(), MAX_SHORT_TEXT)
            }
        }

        impl SectionRecord for $ty {
            const COLLECTION: Collection = Collection::$collection;
        }

        impl IncomeEntry for $ty {
            fn gross_income(&self) -> Money {
                let $s = self;
                $gross
            }

            fn tax_deducted(&self) -> Money {
                self.tax_deducted
            }
        }
    };
}

income_entry!(SalaryIncome, SalaryIncome, employer_name, "incomeDetails.salaryIncome.employerName",
    |s| Money::sum([s.annual_salary, s.allowances, s.bonus]));
income_entry!(BusinessIncome, BusinessIncome, business_name, "incomeDetails.businessIncome.businessName",
    |s| net(s.gross_revenue, s.business_expenses));
income_entry!(RentalIncome, RentalIncome, property_address, "incomeDetails.rentalIncome.propertyAddress",
    |s| s.annual_rent);
income_entry!(CommissionIncome, CommissionIncome, source, "incomeDetails.commissionIncome.source",
    |s| s.amount);
income_entry!(DividendIncome, DividendIncome, company_name, "incomeDetails.dividendIncome.companyName",
    |s| s.amount);
income_entry!(CapitalGainIncome, CapitalGainIncome, asset_description, "incomeDetails.capitalGains.assetDescription",
    |s| net(s.sale_proceeds, s.cost_of_acquisition));
income_entry!(OtherIncome, OtherIncome, description, "incomeDetails.otherIncome.description",
    |s| s.amount);

/// Income details step payload. Absent categories are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeDetails {
    pub salary_income: Option<SalaryIncome>,
    pub business_income: Option<BusinessIncome>,
    pub rental_income: Option<RentalIncome>,
    pub commission_income: Option<CommissionIncome>,
    pub dividend_income: Option<DividendIncome>,
    pub capital_gains: Option<CapitalGainIncome>,
    pub other_income: Option<OtherIncome>,
}

impl Validate for IncomeDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(salary) = &self.salary_income {
            if let Some(ntn) = &salary.employer_ntn {
                crate::identity::Ntn::new(ntn.as_str())?;
            }
        }
        self.salary_income.validate()?;
        self.business_income.validate()?;
        self.rental_income.validate()?;
        self.commission_income.validate()?;
        self.dividend_income.validate()?;
        self.capital_gains.validate()?;
        self.other_income.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn salary_gross_includes_allowances_and_bonus() {
        let s: SalaryIncome = serde_json::from_value(json!({
            "annualSalary": 2400000, "allowances": 300000, "bonus": 100000, "taxDeducted": 150000
        }))
        .unwrap();
        assert_eq!(s.gross_income(), Money::from_rupees(2_800_000));
        assert_eq!(s.tax_deducted(), Money::from_rupees(150_000));
    }

    #[test]
    fn business_loss_floors_at_zero() {
        let b = BusinessIncome {
            gross_revenue: Money::from_rupees(100),
            business_expenses: Money::from_rupees(250),
            ..Default::default()
        };
        assert_eq!(b.gross_income(), Money::ZERO);
    }

    #[test]
    fn capital_gain_is_net_of_cost() {
        let g = CapitalGainIncome {
            sale_proceeds: Money::from_rupees(900),
            cost_of_acquisition: Money::from_rupees(600),
            ..Default::default()
        };
        assert_eq!(g.gross_income(), Money::from_rupees(300));
    }

    #[test]
    fn employer_ntn_is_validated() {
        let details: IncomeDetails = serde_json::from_value(json!({
            "salaryIncome": {"employerNtn": "12"}
        }))
        .unwrap();
        assert!(matches!(details.validate(), Err(ValidationError::InvalidNtn(_))));
    }

    #[test]
    fn absent_categories_stay_none() {
        let details: IncomeDetails =
            serde_json::from_value(json!({"rentalIncome": {"annualRent": 600000}})).unwrap();
        assert!(details.salary_income.is_none());
        assert!(details.rental_income.is_some());
    }
}
