//! Request type chosen during product selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The kind of transaction the buyer is asking for.
///
/// Set exactly once during the ProductSelection stage and immutable for the
/// rest of the session; the required-field set for the later stages is
/// derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// A small trial quantity.
    Sample,
    /// A price quotation.
    Quotation,
    /// A product purchase requisition.
    Ppr,
    /// A full order.
    Order,
}

impl RequestType {
    /// All request types, in presentation order.
    pub const ALL: [RequestType; 4] = [
        RequestType::Sample,
        RequestType::Quotation,
        RequestType::Ppr,
        RequestType::Order,
    ];

    /// Returns the lowercase wire name of the request type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Quotation => "quotation",
            Self::Ppr => "ppr",
            Self::Order => "order",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = ValidationError;

    /// Parses a request type, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(Self::Sample),
            "quotation" | "quote" => Ok(Self::Quotation),
            "ppr" => Ok(Self::Ppr),
            "order" => Ok(Self::Order),
            other => Err(ValidationError::invalid_format(
                "request_type",
                format!(
                    "'{}' is not one of sample, quotation, ppr, order",
                    other
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_lowercase() {
        let json = serde_json::to_string(&RequestType::Order).unwrap();
        assert_eq!(json, "\"order\"");
    }

    #[test]
    fn parses_ignoring_case() {
        assert_eq!("Order".parse::<RequestType>().unwrap(), RequestType::Order);
        assert_eq!(" SAMPLE ".parse::<RequestType>().unwrap(), RequestType::Sample);
        assert_eq!("ppr".parse::<RequestType>().unwrap(), RequestType::Ppr);
    }

    #[test]
    fn parses_quote_alias() {
        assert_eq!(
            "quote".parse::<RequestType>().unwrap(),
            RequestType::Quotation
        );
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "purchase".parse::<RequestType>().unwrap_err();
        assert!(err.to_string().contains("purchase"));
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(RequestType::Quotation.to_string(), "quotation");
    }

    #[test]
    fn all_lists_every_variant_once() {
        assert_eq!(RequestType::ALL.len(), 4);
    }
}
