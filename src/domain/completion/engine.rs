//! Field-completion engine.
//!
//! Pure functions that split a stage's required fields into completed and
//! pending subsets and decide whether the stage is satisfied. Never mutates
//! its inputs; calling any function repeatedly on the same map yields the
//! same result.

use std::collections::BTreeMap;

use crate::domain::catalog::FieldSpec;

use super::field_value::FieldValue;

/// A map from catalog field name to the value collected so far.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Returns true if the stored value for a field counts as complete.
///
/// A field is complete iff a value is present and is not one of the empty
/// sentinels (absent, empty string, numeric 0; see
/// [`FieldValue::is_empty_sentinel`]).
fn is_complete(fields: &FieldMap, name: &str) -> bool {
    fields
        .get(name)
        .map(|value| !value.is_empty_sentinel())
        .unwrap_or(false)
}

/// Returns the required fields that already hold a usable value.
///
/// Result order follows `required`, which itself follows catalog
/// declaration order.
pub fn completed_fields<'a>(
    fields: &FieldMap,
    required: &[&'a FieldSpec],
) -> Vec<&'a FieldSpec> {
    required
        .iter()
        .filter(|spec| is_complete(fields, spec.name))
        .copied()
        .collect()
}

/// Returns the required fields still waiting for a usable value.
pub fn pending_fields<'a>(fields: &FieldMap, required: &[&'a FieldSpec]) -> Vec<&'a FieldSpec> {
    required
        .iter()
        .filter(|spec| !is_complete(fields, spec.name))
        .copied()
        .collect()
}

/// Returns true when every required field holds a usable value.
pub fn is_stage_satisfied(fields: &FieldMap, required: &[&FieldSpec]) -> bool {
    pending_fields(fields, required).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::catalog;
    use crate::domain::session::{RequestType, Stage};

    fn order_required() -> Vec<&'static FieldSpec> {
        catalog().required_fields(RequestType::Order, Stage::RequestDetails)
    }

    fn names(specs: &[&FieldSpec]) -> Vec<&'static str> {
        specs.iter().map(|s| s.name).collect()
    }

    #[test]
    fn empty_map_leaves_everything_pending() {
        let fields = FieldMap::new();
        let required = order_required();

        assert!(completed_fields(&fields, &required).is_empty());
        assert_eq!(names(&pending_fields(&fields, &required)), names(&required));
        assert!(!is_stage_satisfied(&fields, &required));
    }

    #[test]
    fn stored_values_move_fields_to_completed() {
        let mut fields = FieldMap::new();
        fields.insert("quantity".into(), FieldValue::number(50.0));
        fields.insert("unit".into(), FieldValue::text("KG"));
        let required = order_required();

        let completed = names(&completed_fields(&fields, &required));
        assert_eq!(completed, vec!["unit", "quantity"]);
        assert!(!is_stage_satisfied(&fields, &required));
    }

    #[test]
    fn empty_string_does_not_complete_a_field() {
        let mut fields = FieldMap::new();
        fields.insert("incoterm".into(), FieldValue::text(""));
        let required = order_required();

        assert!(completed_fields(&fields, &required).is_empty());
    }

    #[test]
    fn zero_quantity_does_not_complete_a_field() {
        // Known edge case: 0 is an empty sentinel, so a genuinely zero
        // value can never count as provided.
        let mut fields = FieldMap::new();
        fields.insert("quantity".into(), FieldValue::number(0.0));
        let required = order_required();

        assert!(completed_fields(&fields, &required).is_empty());
    }

    #[test]
    fn fully_populated_map_satisfies_the_stage() {
        let required = order_required();
        let mut fields = FieldMap::new();
        for spec in &required {
            fields.insert(spec.name.to_string(), FieldValue::text("x"));
        }
        fields.insert("quantity".into(), FieldValue::number(50.0));
        fields.insert("price_per_unit".into(), FieldValue::number(12.5));
        fields.insert("expected_price".into(), FieldValue::number(625.0));

        assert!(is_stage_satisfied(&fields, &required));
        assert!(pending_fields(&fields, &required).is_empty());
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let mut fields = FieldMap::new();
        fields.insert("color".into(), FieldValue::text("blue"));
        let required = order_required();

        assert!(completed_fields(&fields, &required).is_empty());
        assert_eq!(pending_fields(&fields, &required).len(), required.len());
    }

    #[test]
    fn engine_is_idempotent_and_does_not_mutate() {
        let mut fields = FieldMap::new();
        fields.insert("unit".into(), FieldValue::text("TON"));
        let before = fields.clone();
        let required = order_required();

        let first = names(&completed_fields(&fields, &required));
        let second = names(&completed_fields(&fields, &required));

        assert_eq!(first, second);
        assert_eq!(fields, before);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_field_value() -> impl Strategy<Value = FieldValue> {
            prop_oneof![
                any::<f64>().prop_filter("finite", |n| n.is_finite()).prop_map(FieldValue::number),
                ".{0,12}".prop_map(FieldValue::text),
            ]
        }

        fn arb_field_map() -> impl Strategy<Value = FieldMap> {
            proptest::collection::btree_map(
                prop_oneof![
                    Just("unit".to_string()),
                    Just("quantity".to_string()),
                    Just("price_per_unit".to_string()),
                    Just("expected_price".to_string()),
                    Just("phone".to_string()),
                    Just("incoterm".to_string()),
                    Just("mode_of_payment".to_string()),
                    Just("packaging_pref".to_string()),
                    Just("delivery_date".to_string()),
                    ".{1,8}".prop_map(|s: String| s),
                ],
                arb_field_value(),
                0..12,
            )
        }

        proptest! {
            #[test]
            fn completed_and_pending_partition_required(fields in arb_field_map()) {
                let required = order_required();
                let completed = completed_fields(&fields, &required);
                let pending = pending_fields(&fields, &required);

                // Union covers the full required set, and the parts are disjoint.
                prop_assert_eq!(completed.len() + pending.len(), required.len());
                for spec in &completed {
                    prop_assert!(!pending.iter().any(|p| p.name == spec.name));
                }
            }

            #[test]
            fn satisfied_iff_no_pending(fields in arb_field_map()) {
                let required = order_required();
                prop_assert_eq!(
                    is_stage_satisfied(&fields, &required),
                    pending_fields(&fields, &required).is_empty()
                );
            }
        }
    }
}
