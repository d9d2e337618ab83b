//! # Validation Errors
//!
//! Every domain primitive and wizard section validates its input at the
//! boundary. Failures carry the offending input (or the field path) so the
//! message returned to the client names exactly what was wrong.

use thiserror::Error;

/// Validation errors for domain primitives and section records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// CNIC does not conform to the NADRA format (13 digits).
    #[error("invalid CNIC format: \"{0}\" (expected 13 digits, optionally as XXXXX-XXXXXXX-X)")]
    InvalidCnic(String),

    /// NTN does not conform to the FBR format (7-digit number).
    #[error("invalid NTN format: \"{0}\" (expected 7-digit number)")]
    InvalidNtn(String),

    /// Tax year is not `YYYY`, `YYYY-YY` or `YYYY-YYYY`.
    #[error("invalid tax year: \"{0}\" (expected YYYY, YYYY-YY or YYYY-YYYY)")]
    InvalidTaxYear(String),

    /// Amount could not be parsed or is negative.
    #[error("invalid amount: \"{0}\" (expected a non-negative number with at most 2 decimals)")]
    InvalidAmount(String),

    /// A required field is absent or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A field exceeds its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Field path.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },

    /// A field holds a value outside its permitted set.
    #[error("{field} has unsupported value \"{value}\" (expected one of: {expected})")]
    UnsupportedValue {
        /// Field path.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated list of accepted values.
        expected: &'static str,
    },

    /// Free-form rule violation on a field.
    #[error("{field}: {reason}")]
    Invalid {
        /// Field path.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_the_field() {
        let err = ValidationError::Required("personalInfo.fullName");
        assert_eq!(err.to_string(), "personalInfo.fullName is required");
    }

    #[test]
    fn too_long_reports_limit() {
        let err = ValidationError::TooLong {
            field: "remarks",
            max: 2000,
        };
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn unsupported_value_lists_expected() {
        let err = ValidationError::UnsupportedValue {
            field: "status",
            value: "archived".into(),
            expected: "pending, under_review, completed, rejected",
        };
        let msg = err.to_string();
        assert!(msg.contains("archived"));
        assert!(msg.contains("under_review"));
    }

    #[test]
    fn invalid_cnic_echoes_input() {
        let err = ValidationError::InvalidCnic("12-34".into());
        assert!(err.to_string().contains("12-34"));
    }
}
