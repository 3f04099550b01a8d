//! Field validators.
//!
//! One pure function per field kind. Each takes the raw value (plus
//! contextual bounds where needed) and returns a [`Verdict`] carrying a
//! human-readable reason and, on success, the normalized value to store.

use chrono::{NaiveDate, Utc};

use crate::domain::catalog::FieldSpec;

use super::field_value::FieldValue;

/// The outcome of validating a single field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the value passed validation.
    pub valid: bool,
    /// Human-readable explanation, surfaced to the buyer on failure.
    pub reason: String,
    /// Canonical value to store when valid.
    pub normalized: Option<FieldValue>,
}

impl Verdict {
    /// Creates a passing verdict without a normalized value.
    pub fn accepted(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
            normalized: None,
        }
    }

    /// Creates a passing verdict carrying the value to store.
    pub fn accepted_with(reason: impl Into<String>, normalized: FieldValue) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
            normalized: Some(normalized),
        }
    }

    /// Creates a failing verdict.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
            normalized: None,
        }
    }
}

/// Quantity limits taken from the confirmed product snapshot.
///
/// The minimum defaults to 1 and the available stock to unbounded when the
/// snapshot does not carry them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityBounds {
    min: f64,
    available: f64,
}

impl QuantityBounds {
    /// Creates bounds from the snapshot's optional limits.
    pub fn new(min: Option<f64>, available: Option<f64>) -> Self {
        Self {
            min: min.unwrap_or(1.0),
            available: available.unwrap_or(f64::INFINITY),
        }
    }

    /// Minimum order quantity.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Available stock.
    pub fn available(&self) -> f64 {
        self.available
    }
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Validates a quantity against the product's order limits.
pub fn validate_quantity(raw: &str, bounds: &QuantityBounds) -> Verdict {
    let quantity: f64 = match raw.trim().parse() {
        Ok(q) => q,
        Err(_) => return Verdict::rejected("invalid number format"),
    };

    if quantity < bounds.min() {
        Verdict::rejected(format!(
            "Quantity must be at least {} (minimum order quantity)",
            bounds.min()
        ))
    } else if quantity > bounds.available() {
        Verdict::rejected(format!(
            "Quantity exceeds available stock of {}",
            bounds.available()
        ))
    } else {
        Verdict::accepted_with(
            format!(
                "Quantity {} is valid (min: {}, max: {})",
                quantity,
                bounds.min(),
                bounds.available()
            ),
            FieldValue::number(quantity),
        )
    }
}

/// Validates a plain positive number (e.g., a price per unit).
pub fn validate_positive_number(raw: &str) -> Verdict {
    let value: f64 = match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => return Verdict::rejected("invalid number format"),
    };

    if value > 0.0 {
        Verdict::accepted_with(
            format!("{} is a valid positive number", value),
            FieldValue::number(value),
        )
    } else {
        Verdict::rejected("Value must be a positive number")
    }
}

/// Validates that a date is strictly after `today`.
///
/// Date comparison is at UTC day granularity; today itself is rejected.
pub fn validate_date(raw: &str, today: NaiveDate) -> Verdict {
    let parsed = match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return Verdict::rejected("Invalid date format. Please use YYYY-MM-DD format")
        }
    };

    if parsed <= today {
        Verdict::rejected(format!(
            "Delivery date must be after today ({})",
            today.format("%Y-%m-%d")
        ))
    } else {
        Verdict::accepted_with(
            format!("Delivery date {} is valid", parsed.format("%Y-%m-%d")),
            FieldValue::text(parsed.format("%Y-%m-%d").to_string()),
        )
    }
}

/// Validates a date against the server clock.
pub fn validate_future_date(raw: &str) -> Verdict {
    validate_date(raw, Utc::now().date_naive())
}

/// Validates a selection against the field's catalog options.
///
/// Matching is case-insensitive; on success the canonical-cased option is
/// returned as the normalized value.
pub fn validate_selection(spec: &FieldSpec, raw: &str) -> Verdict {
    if !spec.is_selection() {
        return Verdict::rejected(format!(
            "Field '{}' does not take a fixed selection",
            spec.name
        ));
    }

    let wanted = raw.trim();
    for option in spec.options {
        if option.eq_ignore_ascii_case(wanted) {
            return Verdict::accepted_with(
                format!("Selected {} is valid for {}", option, spec.name),
                FieldValue::text(*option),
            );
        }
    }

    Verdict::rejected(format!(
        "Invalid selection for {}. Allowed options: {}",
        spec.name,
        spec.options.join(", ")
    ))
}

/// Validates a contact phone number.
///
/// Spaces, dashes, and parentheses are stripped; what remains must be at
/// least 10 characters and either a leading-plus international digit form
/// or plain digits. The cleaned string is returned as the normalized value.
pub fn validate_phone(raw: &str) -> Verdict {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let digits_only = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let well_formed = match cleaned.strip_prefix('+') {
        Some(rest) => digits_only(rest),
        None => digits_only(&cleaned),
    };

    if cleaned.len() >= 10 && well_formed {
        Verdict::accepted_with("Phone number format is valid", FieldValue::text(cleaned))
    } else {
        Verdict::rejected("Invalid phone number format")
    }
}

/// Derives the expected price as quantity times price per unit.
///
/// Fails with a computation error iff either operand is non-numeric.
pub fn calculate_expected_price(quantity: &FieldValue, price_per_unit: &FieldValue) -> Verdict {
    match (quantity.numeric(), price_per_unit.numeric()) {
        (Some(q), Some(p)) => {
            let total = q * p;
            Verdict::accepted_with(
                format!("{} x {} = {}", q, p, total),
                FieldValue::number(total),
            )
        }
        _ => Verdict::rejected("Invalid input values for calculation"),
    }
}
