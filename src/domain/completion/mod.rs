//! Completion module - field values, the completion engine, and validators.

mod engine;
mod field_value;
mod validators;

pub use engine::{completed_fields, is_stage_satisfied, pending_fields, FieldMap};
pub use field_value::FieldValue;
pub use validators::{
    calculate_expected_price, validate_date, validate_future_date, validate_phone,
    validate_positive_number, validate_quantity, validate_selection, QuantityBounds, Verdict,
};
