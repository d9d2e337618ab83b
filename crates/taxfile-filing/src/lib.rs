//! # taxfile-filing: Filing Aggregate Services
//!
//! The services behind the wizard and the review surface:
//!
//! - [`FilingWriter`] applies a sparse comprehensive submission across every
//!   section collection in one store transaction, driven by an explicit
//!   [`Plan`] of `(section, strategy, payload)` entries.
//! - [`FilingReader`] assembles the nested view of one `(userId, taxYear)`,
//!   including when no filing exists yet.
//! - [`StepService`] probes the store for the twelve-step progress model,
//!   and applies staff status reviews.
//! - [`report`] compiles and stores filing activity reports.
//!
//! Summaries ([`FilingSummary`]) are derived on every read and never stored.

pub mod error;
pub mod plan;
pub mod progress;
pub mod reader;
pub mod report;
pub mod request;
pub mod snapshot;
pub mod writer;

pub use error::FilingError;
pub use plan::{Plan, PlanEntry, SectionWrite};
pub use progress::{
    DetailedProgress, OverviewFilter, OverviewRow, Resume, StatusUpdate, StepService, StoreProbe,
};
pub use reader::{FilingReader, FilingView};
pub use request::SubmitRequest;
pub use snapshot::{CartView, DocSource, FilingSummary, Snapshot};
pub use writer::{FilingWriter, SubmitOutcome};
