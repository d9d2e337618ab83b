//! # Filing Snapshot
//!
//! Every section of one `(userId, taxYear)` decoded into typed records.
//! Loaded from the committed store by the reader, and from an open
//! transaction by the writer so the response reflects what it is about to
//! commit. The filing summary is derived from it and never stored.

use serde::Serialize;
use taxfile_core::sections::{
    self, AssetSelection, BankAccount, BankLoan, BusinessIncome, CapitalGainIncome, CartItem,
    CashBalance, CommissionIncome, DividendIncome, EducationDeduction, Expenses, IncomeEntry,
    IncomeSources, InvestmentAsset, LineItem, OpeningWealth, OtherAsset, OtherDeduction,
    OtherIncome, OtherLiability, PersonalInfo, PropertyAsset, RentalIncome, SalaryIncome,
    SectionRecord, TaxCredits, ValuableAsset, VehicleAsset, WelfareFundDeduction, WrapUp,
    ZakatDeduction,
};
use taxfile_core::{Collection, FilingStatus, Money, StepProbe, TaxFiling, TaxYear, UserId};
use taxfile_store::{Document, DocumentStore, Key, Record, StoreError, Transaction};

/// Anything documents can be read from.
pub trait DocSource {
    fn find(&self, collection: Collection, filter: &Key) -> Vec<Document>;
}

impl DocSource for DocumentStore {
    fn find(&self, collection: Collection, filter: &Key) -> Vec<Document> {
        DocumentStore::find(self, collection, filter)
    }
}

impl DocSource for Transaction {
    fn find(&self, collection: Collection, filter: &Key) -> Vec<Document> {
        Transaction::find(self, collection, filter)
    }
}

fn all<T: SectionRecord>(src: &impl DocSource, key: &Key) -> Result<Vec<Record<T>>, StoreError> {
    src.find(T::COLLECTION, key).iter().map(Document::decode).collect()
}

fn one<T: SectionRecord>(src: &impl DocSource, key: &Key) -> Result<Option<Record<T>>, StoreError> {
    src.find(T::COLLECTION, key)
        .first()
        .map(Document::decode)
        .transpose()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecords {
    pub salary_income: Option<Record<SalaryIncome>>,
    pub business_income: Option<Record<BusinessIncome>>,
    pub rental_income: Option<Record<RentalIncome>>,
    pub commission_income: Option<Record<CommissionIncome>>,
    pub dividend_income: Option<Record<DividendIncome>>,
    pub capital_gains: Option<Record<CapitalGainIncome>>,
    pub other_income: Option<Record<OtherIncome>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecords {
    pub property_assets: Vec<Record<PropertyAsset>>,
    pub vehicle_assets: Vec<Record<VehicleAsset>>,
    pub bank_accounts: Vec<Record<BankAccount>>,
    pub investments: Vec<Record<InvestmentAsset>>,
    pub valuables: Vec<Record<ValuableAsset>>,
    pub other_assets: Vec<Record<OtherAsset>>,
    pub cash_balance: Option<Record<CashBalance>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionRecords {
    pub zakat: Vec<Record<ZakatDeduction>>,
    pub education_expenses: Vec<Record<EducationDeduction>>,
    pub workers_welfare_fund: Vec<Record<WelfareFundDeduction>>,
    pub other_deductions: Vec<Record<OtherDeduction>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiabilityRecords {
    pub bank_loans: Vec<Record<BankLoan>>,
    pub other_liabilities: Vec<Record<OtherLiability>>,
}

/// Saved cart lines and their priced total.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<Record<CartItem>>,
    pub total: Money,
}

/// Derived totals. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingSummary {
    pub total_income: Money,
    pub tax_deducted: Money,
    pub total_tax_credits: Money,
    pub total_deductions: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    /// `totalAssets - totalLiabilities`; may be negative.
    pub net_wealth: Money,
    /// `netWealth - openingNetWealth`; may be negative.
    pub wealth_increase: Money,
    pub total_expenses: Money,
    pub cart_total: Money,
}

/// Every section of one filing, nulls and empties where nothing is saved.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tax_filing: Option<Record<TaxFiling>>,
    pub personal_info: Option<Record<PersonalInfo>>,
    pub income_sources: Option<Record<IncomeSources>>,
    pub income_details: IncomeRecords,
    pub tax_credits: Option<Record<TaxCredits>>,
    pub opening_wealth: Option<Record<OpeningWealth>>,
    pub asset_selection: Option<Record<AssetSelection>>,
    pub asset_details: AssetRecords,
    pub deductions: DeductionRecords,
    pub liabilities: LiabilityRecords,
    pub expenses: Option<Record<Expenses>>,
    pub wrap_up: Option<Record<WrapUp>>,
    pub cart: CartView,
}

fn lines<T: LineItem>(records: &[Record<T>]) -> Money {
    Money::sum(records.iter().map(|r| r.body.amount()))
}

fn income<T: IncomeEntry>(record: &Option<Record<T>>) -> (Money, Money) {
    record
        .as_ref()
        .map_or((Money::ZERO, Money::ZERO), |r| (r.body.gross_income(), r.body.tax_deducted()))
}

impl Snapshot {
    /// Decode every section for `(user, tax_year)` from `src`.
    ///
    /// Personal info is looked up through the filing id, so it is `None`
    /// whenever there is no filing.
    pub fn load(src: &impl DocSource, user: UserId, tax_year: &TaxYear) -> Result<Self, StoreError> {
        let key = Key::user_year(user, tax_year);
        let tax_filing = one::<TaxFiling>(src, &key)?;
        let personal_info = match &tax_filing {
            Some(f) => one::<PersonalInfo>(src, &Key::filing(f.as_filing_id()))?,
            None => None,
        };
        let items = all::<CartItem>(src, &key)?;
        let cart_total = sections::Cart::total(&items.iter().map(|r| r.body.clone()).collect::<Vec<_>>());

        Ok(Self {
            tax_filing,
            personal_info,
            income_sources: one(src, &key)?,
            income_details: IncomeRecords {
                salary_income: one(src, &key)?,
                business_income: one(src, &key)?,
                rental_income: one(src, &key)?,
                commission_income: one(src, &key)?,
                dividend_income: one(src, &key)?,
                capital_gains: one(src, &key)?,
                other_income: one(src, &key)?,
            },
            tax_credits: one(src, &key)?,
            opening_wealth: one(src, &key)?,
            asset_selection: one(src, &key)?,
            asset_details: AssetRecords {
                property_assets: all(src, &key)?,
                vehicle_assets: all(src, &key)?,
                bank_accounts: all(src, &key)?,
                investments: all(src, &key)?,
                valuables: all(src, &key)?,
                other_assets: all(src, &key)?,
                cash_balance: one(src, &key)?,
            },
            deductions: DeductionRecords {
                zakat: all(src, &key)?,
                education_expenses: all(src, &key)?,
                workers_welfare_fund: all(src, &key)?,
                other_deductions: all(src, &key)?,
            },
            liabilities: LiabilityRecords {
                bank_loans: all(src, &key)?,
                other_liabilities: all(src, &key)?,
            },
            expenses: one(src, &key)?,
            wrap_up: one(src, &key)?,
            cart: CartView {
                items,
                total: cart_total,
            },
        })
    }

    /// Compute the derived totals.
    pub fn summary(&self) -> FilingSummary {
        let inc = &self.income_details;
        let incomes = [
            income(&inc.salary_income),
            income(&inc.business_income),
            income(&inc.rental_income),
            income(&inc.commission_income),
            income(&inc.dividend_income),
            income(&inc.capital_gains),
            income(&inc.other_income),
        ];
        let total_income = Money::sum(incomes.iter().map(|(gross, _)| *gross));
        let tax_deducted = Money::sum(incomes.iter().map(|(_, tax)| *tax));

        let a = &self.asset_details;
        let total_assets = Money::sum([
            lines(&a.property_assets),
            lines(&a.vehicle_assets),
            lines(&a.bank_accounts),
            lines(&a.investments),
            lines(&a.valuables),
            lines(&a.other_assets),
            a.cash_balance.as_ref().map_or(Money::ZERO, |c| c.body.amount),
        ]);

        let d = &self.deductions;
        let total_deductions = Money::sum([
            lines(&d.zakat),
            lines(&d.education_expenses),
            lines(&d.workers_welfare_fund),
            lines(&d.other_deductions),
        ]);

        let total_liabilities = Money::sum([
            lines(&self.liabilities.bank_loans),
            lines(&self.liabilities.other_liabilities),
        ]);

        let net_wealth = total_assets.signed_sub(total_liabilities);
        let opening = self
            .opening_wealth
            .as_ref()
            .map_or(Money::ZERO, |o| o.body.opening_net_wealth);

        FilingSummary {
            total_income,
            tax_deducted,
            total_tax_credits: self.tax_credits.as_ref().map_or(Money::ZERO, |t| t.body.total()),
            total_deductions,
            total_assets,
            total_liabilities,
            net_wealth,
            wealth_increase: net_wealth.signed_sub(opening),
            total_expenses: self.expenses.as_ref().map_or(Money::ZERO, |e| e.body.total()),
            cart_total: self.cart.total,
        }
    }
}

/// The snapshot answers step checks for its own `(userId, taxYear)`.
impl StepProbe for Snapshot {
    fn filing_status(&self) -> Option<FilingStatus> {
        self.tax_filing.as_ref().map(|f| f.body.status)
    }

    fn count(&self, collection: Collection) -> usize {
        let inc = &self.income_details;
        let a = &self.asset_details;
        let d = &self.deductions;
        match collection {
            Collection::TaxFilings => usize::from(self.tax_filing.is_some()),
            Collection::PersonalInfo => usize::from(self.personal_info.is_some()),
            Collection::IncomeSources => usize::from(self.income_sources.is_some()),
            Collection::SalaryIncome => usize::from(inc.salary_income.is_some()),
            Collection::BusinessIncome => usize::from(inc.business_income.is_some()),
            Collection::RentalIncome => usize::from(inc.rental_income.is_some()),
            Collection::CommissionIncome => usize::from(inc.commission_income.is_some()),
            Collection::DividendIncome => usize::from(inc.dividend_income.is_some()),
            Collection::CapitalGainIncome => usize::from(inc.capital_gains.is_some()),
            Collection::OtherIncome => usize::from(inc.other_income.is_some()),
            Collection::TaxCredits => usize::from(self.tax_credits.is_some()),
            Collection::OpeningWealth => usize::from(self.opening_wealth.is_some()),
            Collection::AssetSelection => usize::from(self.asset_selection.is_some()),
            Collection::PropertyAssets => a.property_assets.len(),
            Collection::VehicleAssets => a.vehicle_assets.len(),
            Collection::BankAccounts => a.bank_accounts.len(),
            Collection::InvestmentAssets => a.investments.len(),
            Collection::ValuableAssets => a.valuables.len(),
            Collection::OtherAssets => a.other_assets.len(),
            Collection::CashBalance => usize::from(a.cash_balance.is_some()),
            Collection::ZakatDeductions => d.zakat.len(),
            Collection::EducationDeductions => d.education_expenses.len(),
            Collection::WelfareFundDeductions => d.workers_welfare_fund.len(),
            Collection::OtherDeductions => d.other_deductions.len(),
            Collection::BankLoans => self.liabilities.bank_loans.len(),
            Collection::OtherLiabilities => self.liabilities.other_liabilities.len(),
            Collection::Expenses => usize::from(self.expenses.is_some()),
            Collection::Finalization => usize::from(self.wrap_up.is_some()),
            Collection::CartItems => self.cart.items.len(),
            Collection::ServiceCharges
            | Collection::Accountants
            | Collection::Documents
            | Collection::GstRegistrations
            | Collection::NtnRegistrations
            | Collection::Notifications
            | Collection::Reports => 0,
        }
    }
}
