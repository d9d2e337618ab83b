//! # Identity Newtypes
//!
//! Identifiers used across the filing service. [`UserId`] and [`FilingId`]
//! wrap UUIDs and are valid by construction; [`Cnic`] and [`Ntn`] validate
//! their format when built.
//!
//! - CNIC: NADRA Computerized National Identity Card (13 digits)
//! - NTN: FBR National Tax Number (7 digits)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

/// Identifier of an authenticated account holder (taxpayer or staff member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a new random user identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a Filing (one per user per tax year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilingId(Uuid);

impl FilingId {
    /// Create a new random filing identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FilingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FilingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// National Tax Number.
///
/// Exactly 7 digits. Leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ntn(String);

impl Ntn {
    /// Create an NTN, validating the 7-digit format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNtn`] if the value is not exactly
    /// 7 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.len() != 7 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidNtn(s));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the NTN string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ntn {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ntn> for String {
    fn from(value: Ntn) -> Self {
        value.0
    }
}

impl std::fmt::Display for Ntn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computerized National Identity Card number.
///
/// Accepts `"1234567890123"` or `"12345-6789012-3"` and stores the
/// canonical 13-digit form. Serializes in the dashed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnic(String);

impl Cnic {
    /// Create a CNIC, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCnic`] if the value does not hold
    /// 13 digits, or holds dashes in anything other than the 5-7-1 pattern.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let digits: String = trimmed.chars().filter(|c| *c != '-').collect();
        if digits.len() != 13 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCnic(raw));
        }
        if trimmed.contains('-') {
            let parts: Vec<&str> = trimmed.split('-').collect();
            if parts.len() != 3 || parts[0].len() != 5 || parts[1].len() != 7 || parts[2].len() != 1
            {
                return Err(ValidationError::InvalidCnic(raw));
            }
        }
        Ok(Self(digits))
    }

    /// The canonical 13-digit form (no dashes).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dashed form: XXXXX-XXXXXXX-X.
    pub fn formatted(&self) -> String {
        format!("{}-{}-{}", &self.0[..5], &self.0[5..12], &self.0[12..])
    }
}

impl TryFrom<String> for Cnic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cnic> for String {
    fn from(value: Cnic) -> Self {
        value.formatted()
    }
}

impl std::fmt::Display for Cnic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn user_id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&UserId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn ntn_accepts_seven_digits() {
        let ntn = Ntn::new("0012345").unwrap();
        assert_eq!(ntn.as_str(), "0012345");
    }

    #[test]
    fn ntn_rejects_wrong_length_and_letters() {
        assert!(Ntn::new("123456").is_err());
        assert!(Ntn::new("12345678").is_err());
        assert!(Ntn::new("12345a7").is_err());
    }

    #[test]
    fn cnic_accepts_both_forms() {
        let plain = Cnic::new("3520212345671").unwrap();
        let dashed = Cnic::new("35202-1234567-1").unwrap();
        assert_eq!(plain, dashed);
        assert_eq!(dashed.as_str(), "3520212345671");
        assert_eq!(plain.formatted(), "35202-1234567-1");
    }

    #[test]
    fn cnic_rejects_bad_dash_pattern() {
        assert!(Cnic::new("3520-21234567-1").is_err());
        assert!(Cnic::new("35202-12345671").is_err());
    }

    #[test]
    fn cnic_deserialization_validates() {
        let ok: Result<Cnic, _> = serde_json::from_str("\"35202-1234567-1\"");
        assert!(ok.is_ok());
        let bad: Result<Cnic, _> = serde_json::from_str("\"123\"");
        assert!(bad.is_err());
    }
}
