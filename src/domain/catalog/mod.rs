//! Field catalog - the static table of collectible fields.

#[allow(clippy::module_inception)]
mod catalog;
mod field;

pub use catalog::{catalog, fields, FieldCatalog};
pub use field::{FieldKind, FieldSpec};
