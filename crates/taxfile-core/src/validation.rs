//! Boundary validation for request bodies and section records.

use crate::error::ValidationError;

/// Maximum length of short free-text fields (names, descriptions).
pub const MAX_SHORT_TEXT: usize = 255;

/// Maximum length of long free-text fields (notes, remarks).
pub const MAX_LONG_TEXT: usize = 2000;

/// Types that check their own invariants before being written anywhere.
pub trait Validate {
    /// Check every field rule. The first violation is returned.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

/// Require a non-blank string.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    max_len(field, value, MAX_SHORT_TEXT)
}

/// Require a present, non-blank string.
pub fn require_opt_text(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) => require_text(field, v),
        None => Err(ValidationError::Required(field)),
    }
}

/// Enforce a maximum character count.
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Enforce a maximum character count on an optional field.
pub fn opt_max_len(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}

/// Loose e-mail shape check: one `@` with text on both sides and a dot in
/// the domain.
pub fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let ok = match value.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !domain.contains('@')
        }
        None => false,
    };
    if !ok {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("\"{value}\" is not a valid e-mail address"),
        });
    }
    max_len(field, value, MAX_SHORT_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_required() {
        assert_eq!(
            require_text("fullName", "   "),
            Err(ValidationError::Required("fullName"))
        );
        assert!(require_text("fullName", "Ayesha Khan").is_ok());
    }

    #[test]
    fn missing_optional_text_is_required() {
        assert_eq!(
            require_opt_text("remarks", None),
            Err(ValidationError::Required("remarks"))
        );
    }

    #[test]
    fn length_limits_count_chars() {
        let long = "ب".repeat(MAX_SHORT_TEXT);
        assert!(max_len("name", &long, MAX_SHORT_TEXT).is_ok());
        let longer = format!("{long}x");
        assert!(max_len("name", &longer, MAX_SHORT_TEXT).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "user@example.pk").is_ok());
        assert!(email("email", "user@localhost").is_err());
        assert!(email("email", "@example.pk").is_err());
        assert!(email("email", "user.example.pk").is_err());
    }

    struct AlwaysBad;
    impl Validate for AlwaysBad {
        fn validate(&self) -> Result<(), ValidationError> {
            Err(ValidationError::Required("x"))
        }
    }

    #[test]
    fn vec_and_option_delegate() {
        assert!(Vec::<AlwaysBad>::new().validate().is_ok());
        assert!(vec![AlwaysBad].validate().is_err());
        assert!(None::<AlwaysBad>.validate().is_ok());
        assert!(Some(AlwaysBad).validate().is_err());
    }
}
