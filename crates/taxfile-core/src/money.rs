//! # Money
//!
//! Fixed-point PKR amounts held as integer paisa. Floats never take part in
//! arithmetic: JSON numbers are read through their decimal text, so
//! `5000000` and `"5000000.50"` parse exactly. Whole rupees serialize as a
//! JSON integer; anything with paisa serializes as a decimal string.
//!
//! Amounts entered in the wizard are non-negative. Derived figures (net
//! wealth, wealth increase) may go negative and are produced through
//! [`Money::signed_sub`].

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// An amount of Pakistani rupees with paisa precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money(0);

    /// Build from whole rupees.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees.saturating_mul(100))
    }

    /// Build from paisa.
    pub fn from_paisa(paisa: i64) -> Self {
        Self(paisa)
    }

    /// The amount in paisa.
    pub fn paisa(&self) -> i64 {
        self.0
    }

    /// Parse a decimal string (`"1500"`, `"1500.5"`, `"1500.50"`).
    ///
    /// More than two decimals are truncated. Negative input is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] for anything that is not a
    /// non-negative decimal that fits in `i64` paisa.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidAmount(s.to_string());
        let t = s.trim();
        if t.is_empty() || t.starts_with('-') || t.starts_with('+') {
            return Err(invalid());
        }

        let (int_part, frac_part) = match t.split_once('.') {
            Some((i, f)) => (i, f),
            None => (t, ""),
        };
        if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: i64 = int_part.parse().map_err(|_| invalid())?;
        let paisa: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_part[..2].parse().map_err(|_| invalid())?,
        };

        rupees
            .checked_mul(100)
            .and_then(|v| v.checked_add(paisa))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Saturating addition.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction that may go below zero.
    pub fn signed_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Multiply by a whole quantity.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Sum an iterator of amounts.
    pub fn sum<I: IntoIterator<Item = Money>>(iter: I) -> Money {
        iter.into_iter().fold(Money::ZERO, Money::saturating_add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            // Decimal text keeps exact paisa at any magnitude.
            serializer.collect_str(self)
        }
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-negative amount as a number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let rupees = i64::try_from(v).map_err(|_| E::custom(ValidationError::InvalidAmount(v.to_string())))?;
        rupees
            .checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(ValidationError::InvalidAmount(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        if v < 0 {
            return Err(E::custom(ValidationError::InvalidAmount(v.to_string())));
        }
        self.visit_u64(v.unsigned_abs())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(E::custom(ValidationError::InvalidAmount(v.to_string())));
        }
        // `{}` on f64 never uses exponent notation for finite values.
        Money::parse(&format!("{v}")).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_whole_and_decimal() {
        assert_eq!(Money::parse("10000").unwrap().paisa(), 1_000_000);
        assert_eq!(Money::parse("100.5").unwrap().paisa(), 10_050);
        assert_eq!(Money::parse("0.01").unwrap().paisa(), 1);
        assert_eq!(Money::parse("12.345").unwrap().paisa(), 1_234);
    }

    #[test]
    fn parse_rejects_negative_and_garbage() {
        assert!(Money::parse("-1").is_err());
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse(".5").is_err());
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let a: Money = serde_json::from_str("5000000").unwrap();
        assert_eq!(a, Money::from_rupees(5_000_000));
        let b: Money = serde_json::from_str("\"2500.75\"").unwrap();
        assert_eq!(b.paisa(), 250_075);
        let c: Money = serde_json::from_str("99.9").unwrap();
        assert_eq!(c.paisa(), 9_990);
    }

    #[test]
    fn deserialization_rejects_negative() {
        assert!(serde_json::from_str::<Money>("-5").is_err());
        assert!(serde_json::from_str::<Money>("\"-5\"").is_err());
        assert!(serde_json::from_str::<Money>("true").is_err());
    }

    #[test]
    fn serializes_whole_rupees_as_integer() {
        let json = serde_json::to_value(Money::from_rupees(5_000_000)).unwrap();
        assert_eq!(json, serde_json::json!(5_000_000));
        let json = serde_json::to_value(Money::from_paisa(150)).unwrap();
        assert_eq!(json, serde_json::json!("1.50"));
    }

    #[test]
    fn large_fractional_amount_survives_storage() {
        // Above 2^53 paisa, where an f64 can no longer hold every value.
        let m = Money::from_paisa((1i64 << 53) + 1);
        let stored = serde_json::to_value(m).unwrap();
        assert_eq!(stored, serde_json::json!("90071992547409.93"));
        assert_eq!(serde_json::from_value::<Money>(stored).unwrap(), m);
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::from_paisa(450_000).to_string(), "4500.00");
        assert_eq!(Money::ZERO.signed_sub(Money::from_paisa(5)).to_string(), "-0.05");
    }

    #[test]
    fn arithmetic_saturates() {
        let max = Money::from_paisa(i64::MAX);
        assert_eq!(max.saturating_add(Money::from_rupees(1)), max);
        assert_eq!(Money::from_rupees(3).times(4), Money::from_rupees(12));
        assert_eq!(
            Money::sum([Money::from_rupees(1), Money::from_rupees(2)]),
            Money::from_rupees(3)
        );
    }

    proptest! {
        #[test]
        fn display_then_parse_is_identity(paisa in 0i64..1_000_000_000_000) {
            let m = Money::from_paisa(paisa);
            prop_assert_eq!(Money::parse(&m.to_string()).unwrap(), m);
        }

        #[test]
        fn json_keeps_exact_paisa(paisa in 0i64..i64::MAX) {
            let m = Money::from_paisa(paisa);
            let back: Money = serde_json::from_value(serde_json::to_value(m).unwrap()).unwrap();
            prop_assert_eq!(back, m);
        }
    }
}
