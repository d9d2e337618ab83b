//! # taxfile-core: Domain Types for the Tax Filing Service
//!
//! Everything the filing wizard and back office agree on, with no I/O:
//!
//! 1. **Validated primitives.** [`TaxYear`], [`Cnic`], [`Ntn`] and [`Money`]
//!    reject malformed input at deserialization; [`UserId`] and
//!    [`FilingId`] are distinct UUID newtypes.
//!
//! 2. **One [`Collection`] catalogue.** Every entity store is a variant with
//!    a wire name and a key shape. No stringly-typed table names elsewhere.
//!
//! 3. **Section DTOs.** One typed record per wizard step in [`sections`],
//!    each implementing [`Validate`] and naming its collection.
//!
//! 4. **Back-office records** in [`backoffice`]: price list, accountants,
//!    documents, registrations, notifications, reports.
//!
//! 5. **Pure step evaluation.** [`steps::evaluate`] turns record counts into
//!    the twelve-step progress model.

pub mod backoffice;
pub mod collection;
pub mod error;
pub mod filing;
pub mod identity;
pub mod money;
pub mod sections;
pub mod steps;
pub mod tax_year;
pub mod validation;

pub use collection::{Collection, KeyShape};
pub use error::ValidationError;
pub use filing::{
    FilingStatus, FilingType, Payment, PaymentMethod, PaymentStatus, StatusChange, TaxFiling,
};
pub use identity::{Cnic, FilingId, Ntn, UserId};
pub use money::Money;
pub use steps::{Progress, StepProbe, StepStatus};
pub use tax_year::TaxYear;
pub use validation::Validate;
