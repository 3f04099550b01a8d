//! The static field catalog.
//!
//! One declarative table describing every field the assistant can collect:
//! its kind, allowed options, which request types require it, and which
//! stage owns it. All required-field computation is derived from here.

use once_cell::sync::Lazy;

use crate::domain::session::{RequestType, Stage};

use super::field::{FieldKind, FieldSpec};

/// Canonical field names, for use as keys into the session's field map.
pub mod fields {
    pub const UNIT: &str = "unit";
    pub const QUANTITY: &str = "quantity";
    pub const PRICE_PER_UNIT: &str = "price_per_unit";
    pub const EXPECTED_PRICE: &str = "expected_price";
    pub const PHONE: &str = "phone";
    pub const INCOTERM: &str = "incoterm";
    pub const MODE_OF_PAYMENT: &str = "mode_of_payment";
    pub const PACKAGING_PREF: &str = "packaging_pref";
    pub const DELIVERY_DATE: &str = "delivery_date";
    pub const ADDRESS: &str = "address";
    pub const INDUSTRY: &str = "industry";
}

const ALL_TYPES: &[RequestType] = &[
    RequestType::Order,
    RequestType::Sample,
    RequestType::Quotation,
    RequestType::Ppr,
];

const COMMERCIAL_TYPES: &[RequestType] = &[
    RequestType::Order,
    RequestType::Sample,
    RequestType::Quotation,
];

const ENTRIES: &[FieldSpec] = &[
    FieldSpec {
        name: fields::UNIT,
        kind: FieldKind::Select,
        options: &["KG", "TON"],
        required_for: ALL_TYPES,
        owner: Stage::RequestDetails,
        description: "Unit of measurement for the product",
    },
    FieldSpec {
        name: fields::QUANTITY,
        kind: FieldKind::Number,
        options: &[],
        required_for: ALL_TYPES,
        owner: Stage::RequestDetails,
        description: "Quantity required, within the product's order limits",
    },
    FieldSpec {
        name: fields::PRICE_PER_UNIT,
        kind: FieldKind::Number,
        options: &[],
        required_for: ALL_TYPES,
        owner: Stage::RequestDetails,
        description: "Offered price per unit",
    },
    FieldSpec {
        name: fields::EXPECTED_PRICE,
        kind: FieldKind::Calculated,
        options: &[],
        required_for: ALL_TYPES,
        owner: Stage::RequestDetails,
        description: "Total price, computed as quantity times price per unit",
    },
    FieldSpec {
        name: fields::PHONE,
        kind: FieldKind::Phone,
        options: &[],
        required_for: COMMERCIAL_TYPES,
        owner: Stage::RequestDetails,
        description: "Contact phone number",
    },
    FieldSpec {
        name: fields::INCOTERM,
        kind: FieldKind::Select,
        options: &["Ex Factory", "Deliver to Buyer Factory"],
        required_for: COMMERCIAL_TYPES,
        owner: Stage::RequestDetails,
        description: "International commercial terms",
    },
    FieldSpec {
        name: fields::MODE_OF_PAYMENT,
        kind: FieldKind::Select,
        options: &["LC", "TT", "Cash"],
        required_for: COMMERCIAL_TYPES,
        owner: Stage::RequestDetails,
        description: "Payment method",
    },
    FieldSpec {
        name: fields::PACKAGING_PREF,
        kind: FieldKind::Select,
        options: &["Bulk Tanker", "PP Bag", "Jerry Can", "Drum"],
        required_for: COMMERCIAL_TYPES,
        owner: Stage::RequestDetails,
        description: "Packaging preference",
    },
    FieldSpec {
        name: fields::DELIVERY_DATE,
        kind: FieldKind::Date,
        options: &[],
        required_for: ALL_TYPES,
        owner: Stage::RequestDetails,
        description: "Delivery date, must be after today (YYYY-MM-DD)",
    },
    FieldSpec {
        name: fields::ADDRESS,
        kind: FieldKind::Select,
        options: &[],
        required_for: ALL_TYPES,
        owner: Stage::AddressPurpose,
        description: "Delivery address, chosen from the buyer's saved addresses",
    },
    FieldSpec {
        name: fields::INDUSTRY,
        kind: FieldKind::Select,
        options: &[],
        required_for: &[RequestType::Order, RequestType::Ppr],
        owner: Stage::AddressPurpose,
        description: "Target industry for the purchase",
    },
];

/// Lookup view over the static field entries.
///
/// Pure and deterministic: every method is a filter over the declaration
/// table, returning entries in declaration order.
#[derive(Debug)]
pub struct FieldCatalog {
    entries: &'static [FieldSpec],
}

static CATALOG: Lazy<FieldCatalog> = Lazy::new(|| FieldCatalog { entries: ENTRIES });

/// Returns the process-wide field catalog.
pub fn catalog() -> &'static FieldCatalog {
    &CATALOG
}

impl FieldCatalog {
    /// Returns every catalog entry, in declaration order.
    pub fn entries(&self) -> &'static [FieldSpec] {
        self.entries
    }

    /// Returns the fields the given stage must collect for a request type.
    ///
    /// The union of all entries whose `required_for` contains the type,
    /// restricted to the asking stage, so a later stage only ever asks
    /// about the fields it owns.
    pub fn required_fields(
        &self,
        request_type: RequestType,
        stage: Stage,
    ) -> Vec<&'static FieldSpec> {
        self.entries
            .iter()
            .filter(|spec| spec.owner == stage && spec.is_required_for(request_type))
            .collect()
    }

    /// Returns every field owned by a stage, regardless of request type.
    pub fn fields_owned_by(&self, stage: Stage) -> Vec<&'static FieldSpec> {
        self.entries
            .iter()
            .filter(|spec| spec.owner == stage)
            .collect()
    }

    /// Looks up a single field by its canonical name.
    pub fn spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.entries.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_for_order_covers_all_request_detail_fields() {
        let names: Vec<&str> = catalog()
            .required_fields(RequestType::Order, Stage::RequestDetails)
            .iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "unit",
                "quantity",
                "price_per_unit",
                "expected_price",
                "phone",
                "incoterm",
                "mode_of_payment",
                "packaging_pref",
                "delivery_date",
            ]
        );
    }

    #[test]
    fn ppr_skips_the_commercial_only_fields() {
        let names: Vec<&str> = catalog()
            .required_fields(RequestType::Ppr, Stage::RequestDetails)
            .iter()
            .map(|s| s.name)
            .collect();

        assert!(!names.contains(&"phone"));
        assert!(!names.contains(&"incoterm"));
        assert!(!names.contains(&"mode_of_payment"));
        assert!(!names.contains(&"packaging_pref"));
        assert!(names.contains(&"quantity"));
        assert!(names.contains(&"delivery_date"));
    }

    #[test]
    fn required_fields_is_restricted_to_the_asking_stage() {
        let details = catalog().required_fields(RequestType::Order, Stage::RequestDetails);
        assert!(details.iter().all(|s| s.owner == Stage::RequestDetails));

        let delivery: Vec<&str> = catalog()
            .required_fields(RequestType::Order, Stage::AddressPurpose)
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(delivery, vec!["address", "industry"]);
    }

    #[test]
    fn industry_not_required_for_sample_or_quotation() {
        for rt in [RequestType::Sample, RequestType::Quotation] {
            let names: Vec<&str> = catalog()
                .required_fields(rt, Stage::AddressPurpose)
                .iter()
                .map(|s| s.name)
                .collect();
            assert_eq!(names, vec!["address"]);
        }
    }

    #[test]
    fn required_fields_is_deterministic() {
        let first = catalog().required_fields(RequestType::Order, Stage::RequestDetails);
        let second = catalog().required_fields(RequestType::Order, Stage::RequestDetails);
        assert_eq!(first, second);
    }

    #[test]
    fn required_fields_is_a_subset_of_the_catalog() {
        for rt in RequestType::ALL {
            for stage in [Stage::RequestDetails, Stage::AddressPurpose] {
                for spec in catalog().required_fields(rt, stage) {
                    assert!(catalog().spec(spec.name).is_some());
                }
            }
        }
    }

    #[test]
    fn spec_finds_entries_by_name() {
        let spec = catalog().spec("incoterm").unwrap();
        assert_eq!(spec.options, &["Ex Factory", "Deliver to Buyer Factory"]);
        assert!(catalog().spec("color").is_none());
    }

    #[test]
    fn fields_owned_by_partitions_the_catalog() {
        let details = catalog().fields_owned_by(Stage::RequestDetails).len();
        let delivery = catalog().fields_owned_by(Stage::AddressPurpose).len();
        let selection = catalog().fields_owned_by(Stage::ProductSelection).len();

        assert_eq!(details + delivery + selection, catalog().entries().len());
        assert_eq!(selection, 0);
    }
}
