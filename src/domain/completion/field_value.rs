//! Stored field values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value stored for a collectible field.
///
/// Values arrive as free text from the conversation and are stored either
/// as text (selections, phone numbers, dates) or as numbers (quantities,
/// prices). Serialized untagged so session records stay plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A numeric value.
    Number(f64),
    /// A textual value.
    Text(String),
}

impl FieldValue {
    /// Creates a numeric value.
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    /// Creates a textual value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the value as a number, parsing text when possible.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Returns the textual form of the value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Returns true if this value is one of the "not yet provided" sentinels.
    ///
    /// Empty strings and the numeric literal 0 both count as empty, matching
    /// the completion rules this engine inherits. The zero sentinel means a
    /// legitimately zero quantity can never be marked complete; quantities
    /// here are always at least the product's minimum, so the ambiguity is
    /// accepted rather than silently changed.
    pub fn is_empty_sentinel(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => *n == 0.0,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_reads_numbers_directly() {
        assert_eq!(FieldValue::number(12.5).numeric(), Some(12.5));
    }

    #[test]
    fn numeric_parses_numeric_text() {
        assert_eq!(FieldValue::text(" 50 ").numeric(), Some(50.0));
        assert_eq!(FieldValue::text("abc").numeric(), None);
    }

    #[test]
    fn empty_string_is_a_sentinel() {
        assert!(FieldValue::text("").is_empty_sentinel());
        assert!(FieldValue::text("   ").is_empty_sentinel());
        assert!(!FieldValue::text("KG").is_empty_sentinel());
    }

    #[test]
    fn zero_is_a_sentinel() {
        assert!(FieldValue::number(0.0).is_empty_sentinel());
        assert!(!FieldValue::number(0.5).is_empty_sentinel());
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(
            serde_json::to_string(&FieldValue::number(625.0)).unwrap(),
            "625.0"
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::text("TT")).unwrap(),
            "\"TT\""
        );
    }

    #[test]
    fn deserializes_untagged() {
        let n: FieldValue = serde_json::from_str("50").unwrap();
        assert_eq!(n, FieldValue::number(50.0));

        let t: FieldValue = serde_json::from_str("\"Drum\"").unwrap();
        assert_eq!(t, FieldValue::text("Drum"));
    }
}
