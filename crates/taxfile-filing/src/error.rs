use taxfile_core::{TaxYear, ValidationError};
use taxfile_store::StoreError;
use thiserror::Error;

/// Errors from the filing aggregate services.
#[derive(Error, Debug)]
pub enum FilingError {
    /// A required request field is absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The filing for this tax year is closed to resubmission.
    #[error("tax filing for {tax_year} is already completed and cannot be resubmitted")]
    AlreadyCompleted { tax_year: TaxYear },

    /// A section or primitive failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A cart line names a service that is not on the active price list.
    #[error("unknown or inactive service: {0}")]
    UnknownService(String),

    /// No filing matched.
    #[error("{0}")]
    NotFound(String),

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A section could not be encoded for storage.
    #[error("failed to encode {section}: {source}")]
    Codec {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
