//! Tax year identifier.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A tax year label as used by the wizard: `"2024"`, `"2024-25"` or
/// `"2024-2025"`. Range forms must name consecutive years.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxYear(String);

impl TaxYear {
    /// Parse and validate a tax year label.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTaxYear`] for any other shape.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let s = raw.trim();
        let invalid = || ValidationError::InvalidTaxYear(raw.clone());

        let (start, end) = match s.split_once('-') {
            None => (s, None),
            Some((start, end)) => (start, Some(end)),
        };
        let start_year = parse_year(start).ok_or_else(invalid)?;

        if let Some(end) = end {
            let expected = start_year + 1;
            let matches = match end.len() {
                2 => end.chars().all(|c| c.is_ascii_digit()) && end == format!("{:02}", expected % 100),
                4 => parse_year(end) == Some(expected),
                _ => false,
            };
            if !matches {
                return Err(invalid());
            }
        }

        Ok(Self(s.to_string()))
    }

    /// The label as submitted (trimmed).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_year(s: &str) -> Option<u16> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl TryFrom<String> for TaxYear {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxYear> for String {
    fn from(value: TaxYear) -> Self {
        value.0
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_year() {
        let ty = TaxYear::new("2024").unwrap();
        assert_eq!(ty.as_str(), "2024");
    }

    #[test]
    fn accepts_short_and_long_ranges() {
        assert!(TaxYear::new("2024-25").is_ok());
        assert!(TaxYear::new("2024-2025").is_ok());
        assert!(TaxYear::new("1999-00").is_ok());
    }

    #[test]
    fn rejects_non_consecutive_ranges() {
        assert!(TaxYear::new("2024-26").is_err());
        assert!(TaxYear::new("2024-2026").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(TaxYear::new("").is_err());
        assert!(TaxYear::new("24").is_err());
        assert!(TaxYear::new("FY2024").is_err());
        assert!(TaxYear::new("2024-2").is_err());
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(TaxYear::new(" 2023 ").unwrap().as_str(), "2023");
    }
}
