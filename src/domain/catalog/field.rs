//! Field specification - schema and metadata for a collectible field.

use serde::{Deserialize, Serialize};

use crate::domain::session::{RequestType, Stage};

/// The value kind of a collectible field, which selects its validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// One of a fixed set of options.
    Select,
    /// A numeric value.
    Number,
    /// A contact phone number.
    Phone,
    /// A future calendar date.
    Date,
    /// Derived from other fields, never asked of the user.
    Calculated,
}

/// Static description of a single collectible field.
///
/// Catalog entries are declared once at process start and never mutated;
/// everything else (required sets, validation routing, prompt text) is
/// derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name, used as the key in the session's field map.
    pub name: &'static str,

    /// Value kind, selecting the validator that guards this field.
    pub kind: FieldKind,

    /// Allowed options for `Select` fields, in canonical casing.
    pub options: &'static [&'static str],

    /// Request types for which this field must be collected.
    pub required_for: &'static [RequestType],

    /// The stage responsible for collecting this field.
    pub owner: Stage,

    /// One-line description surfaced to the reasoning service.
    pub description: &'static str,
}

impl FieldSpec {
    /// Returns true if this field must be collected for the given request type.
    pub fn is_required_for(&self, request_type: RequestType) -> bool {
        self.required_for.contains(&request_type)
    }

    /// Returns true if this field takes one of a fixed set of options.
    pub fn is_selection(&self) -> bool {
        self.kind == FieldKind::Select && !self.options.is_empty()
    }
}
