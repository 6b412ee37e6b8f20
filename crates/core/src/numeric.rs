//! Lenient numeric input handling using `rust_decimal`.
//!
//! Quantities typed into a draft are kept as the raw text the user entered.
//! A value that does not parse as a decimal is never an error here: derived
//! metrics treat it as zero and required-field checks treat it as blank.
//! No `f64` anywhere on the derivation path.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parse user-entered text as a decimal, returning `None` for blank or
/// non-numeric input.
pub fn parse_lenient(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parse user-entered text as a decimal, treating anything unparseable as zero.
pub fn or_zero(raw: &str) -> Decimal {
    parse_lenient(raw).unwrap_or(Decimal::ZERO)
}

/// Sum that clamps at [`Decimal::MAX`] / [`Decimal::MIN`] instead of
/// overflowing.
pub fn add_saturating(total: Decimal, value: Decimal) -> Decimal {
    total.checked_add(value).unwrap_or(if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Round to two decimal places with banker's rounding.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Raw numeric text as typed into a form field.
///
/// Serializes as the raw string. Deserializes from a JSON number, a JSON
/// string, or `null` (blank), since the backend returns stored quantities as
/// numbers while drafts carry whatever was typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NumericInput(String);

impl NumericInput {
    pub fn new(raw: impl Into<String>) -> Self {
        NumericInput(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parsed value, or `None` when blank or non-numeric.
    pub fn value(&self) -> Option<Decimal> {
        parse_lenient(&self.0)
    }

    pub fn or_zero(&self) -> Decimal {
        or_zero(&self.0)
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NumericInput {
    fn from(raw: &str) -> Self {
        NumericInput(raw.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(raw: String) -> Self {
        NumericInput(raw)
    }
}

impl From<Decimal> for NumericInput {
    fn from(value: Decimal) -> Self {
        NumericInput(value.normalize().to_string())
    }
}

impl Serialize for NumericInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(serde_json::Number),
            Text(String),
            Blank(()),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(n) => NumericInput(n.to_string()),
            Wire::Text(s) => NumericInput(s),
            Wire::Blank(()) => NumericInput::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_saturating_clamps_both_ends() {
        assert_eq!(add_saturating(Decimal::from(2), Decimal::from(3)), Decimal::from(5));
        assert_eq!(add_saturating(Decimal::MAX, Decimal::ONE), Decimal::MAX);
        assert_eq!(add_saturating(Decimal::MIN, Decimal::NEGATIVE_ONE), Decimal::MIN);
        assert_eq!(add_saturating(Decimal::MAX, Decimal::NEGATIVE_ONE), Decimal::MAX - Decimal::ONE);
    }

    #[test]
    fn parses_plain_and_padded_numbers() {
        assert_eq!(parse_lenient("12"), Some(Decimal::from(12)));
        assert_eq!(parse_lenient("  2.5 "), Some(Decimal::new(25, 1)));
        assert_eq!(parse_lenient("-3"), Some(Decimal::from(-3)));
    }

    #[test]
    fn blank_and_garbage_are_none() {
        assert_eq!(parse_lenient(""), None);
        assert_eq!(parse_lenient("   "), None);
        assert_eq!(parse_lenient("abc"), None);
        assert_eq!(parse_lenient("12kg"), None);
    }

    #[test]
    fn or_zero_never_fails() {
        assert_eq!(or_zero("abc"), Decimal::ZERO);
        assert_eq!(or_zero("7"), Decimal::from(7));
    }

    #[test]
    fn round_money_uses_bankers_rounding() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(100, 2));
        assert_eq!(round_money(Decimal::new(1015, 3)), Decimal::new(102, 2));
    }

    #[test]
    fn deserializes_numbers_strings_and_null() {
        let n: NumericInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.value(), Some(Decimal::new(125, 1)));
        let s: NumericInput = serde_json::from_str("\"8\"").unwrap();
        assert_eq!(s.as_str(), "8");
        let blank: NumericInput = serde_json::from_str("null").unwrap();
        assert!(blank.is_blank());
    }

    #[test]
    fn serializes_raw_text() {
        let n = NumericInput::from("4.0");
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"4.0\"");
    }
}
