//! Product records, the confirmed-product snapshot, and the per-session
//! search cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::Timestamp;

/// Units the assistant is allowed to trade in.
pub const ALLOWED_UNITS: [&str; 2] = ["KG", "TON"];

/// A product row as returned by the inventory lookup.
///
/// Field aliases accept the marketplace wire names (`_id`, `nameEn`, ...);
/// persisted session records round-trip through the snake_case names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "nameEn")]
    pub name_en: String,

    #[serde(default, alias = "brandEn")]
    pub brand_en: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default, alias = "minQuantity")]
    pub min_quantity: Option<f64>,

    /// Stock on hand, which doubles as the upper quantity limit.
    #[serde(default, alias = "quantity", alias = "maxQuantity")]
    pub available_quantity: Option<f64>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default, alias = "specificationEn")]
    pub specification_en: Option<String>,

    #[serde(default, alias = "descriptionEn")]
    pub description_en: Option<String>,
}

impl ProductRecord {
    /// Returns true if the product's unit is one the assistant trades in.
    pub fn has_allowed_unit(&self) -> bool {
        ALLOWED_UNITS
            .iter()
            .any(|u| u.eq_ignore_ascii_case(self.unit.trim()))
    }
}

/// The product confirmed during product selection.
///
/// A full copy of the record captured at confirmation time, not a live
/// re-fetch: later validation (quantity limits, pricing) always runs
/// against the same data the buyer confirmed, even if upstream inventory
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub product_name: String,
    pub details: ProductRecord,
    pub confirmed_at: Timestamp,
}

impl ProductSnapshot {
    /// Captures a snapshot of a looked-up record at confirmation time.
    pub fn capture(record: ProductRecord) -> Self {
        Self {
            product_id: record.id.clone(),
            product_name: record.name_en.clone(),
            details: record,
            confirmed_at: Timestamp::now(),
        }
    }
}

/// Session-owned cache of inventory search results, keyed by query text.
///
/// Owned by the session rather than shared across the process, so
/// concurrent sessions stay independent. Queries that produced zero usable
/// products are never cached; they are retried on the next ask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCache {
    entries: BTreeMap<String, Vec<ProductRecord>>,
}

impl SearchCache {
    fn normalize(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Returns cached results for a query, if any usable ones were stored.
    pub fn get(&self, query: &str) -> Option<&[ProductRecord]> {
        self.entries
            .get(&Self::normalize(query))
            .map(|v| v.as_slice())
    }

    /// Stores results for a query. Empty result sets are not stored.
    pub fn put(&mut self, query: &str, products: Vec<ProductRecord>) {
        if products.is_empty() {
            return;
        }
        self.entries.insert(Self::normalize(query), products);
    }

    /// Finds a product by id across every cached result set.
    ///
    /// This is the only source of confirmable products: a product that was
    /// never returned by a lookup cannot be confirmed.
    pub fn find_product(&self, id: &str) -> Option<&ProductRecord> {
        self.entries
            .values()
            .flat_map(|products| products.iter())
            .find(|p| p.id == id)
    }

    /// Returns true if no results have been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acid(id: &str, unit: &str) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name_en: "Sulfuric Acid".to_string(),
            brand_en: "AcmeChem".to_string(),
            unit: unit.to_string(),
            min_quantity: Some(10.0),
            available_quantity: Some(100.0),
            price: Some(12.0),
            specification_en: None,
            description_en: None,
        }
    }

    #[test]
    fn allowed_units_are_case_insensitive() {
        assert!(acid("p1", "KG").has_allowed_unit());
        assert!(acid("p1", "ton").has_allowed_unit());
        assert!(!acid("p1", "Litre").has_allowed_unit());
        assert!(!acid("p1", "").has_allowed_unit());
    }

    #[test]
    fn record_deserializes_from_marketplace_wire_names() {
        let json = r#"{
            "_id": "64fa",
            "nameEn": "Sulfuric Acid",
            "brandEn": "AcmeChem",
            "unit": "KG",
            "minQuantity": 10,
            "quantity": 100
        }"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "64fa");
        assert_eq!(record.name_en, "Sulfuric Acid");
        assert_eq!(record.min_quantity, Some(10.0));
        assert_eq!(record.available_quantity, Some(100.0));
    }

    #[test]
    fn record_round_trips_through_snake_case() {
        let record = acid("p1", "KG");
        let json = serde_json::to_string(&record).unwrap();
        let back: ProductRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn snapshot_copies_id_and_name() {
        let snapshot = ProductSnapshot::capture(acid("p1", "KG"));
        assert_eq!(snapshot.product_id, "p1");
        assert_eq!(snapshot.product_name, "Sulfuric Acid");
        assert_eq!(snapshot.details.available_quantity, Some(100.0));
    }

    mod search_cache {
        use super::*;

        #[test]
        fn stores_and_retrieves_by_normalized_query() {
            let mut cache = SearchCache::default();
            cache.put("Sulfuric Acid", vec![acid("p1", "KG")]);

            assert_eq!(cache.get("  sulfuric acid ").unwrap().len(), 1);
            assert!(cache.get("nitric acid").is_none());
        }

        #[test]
        fn never_caches_empty_result_sets() {
            let mut cache = SearchCache::default();
            cache.put("unobtainium", vec![]);

            assert!(cache.get("unobtainium").is_none());
            assert!(cache.is_empty());
        }

        #[test]
        fn find_product_searches_all_entries() {
            let mut cache = SearchCache::default();
            cache.put("acid", vec![acid("p1", "KG"), acid("p2", "TON")]);
            cache.put("base", vec![acid("p3", "KG")]);

            assert_eq!(cache.find_product("p3").unwrap().id, "p3");
            assert!(cache.find_product("p9").is_none());
        }
    }
}
