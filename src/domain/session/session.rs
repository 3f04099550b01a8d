//! The session aggregate.
//!
//! One record per conversation, holding the active stage, the confirmed
//! product and request type, the per-stage substructures, and the
//! conversation history. Mutated only by the router and the currently
//! active stage handler.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{catalog, fields};
use crate::domain::completion::{FieldMap, FieldValue};
use crate::domain::foundation::{SessionId, Timestamp, UserAuth, ValidationError};

use super::directory::{AddressRecord, IndustryRecord};
use super::product::{ProductRecord, ProductSnapshot, SearchCache};
use super::request_type::RequestType;
use super::stage::Stage;

/// One (user, assistant) turn in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl Exchange {
    /// Creates a new exchange.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Substructure owned by the RequestDetails stage.
///
/// Created empty by stage expansion when the session hands over from
/// product selection; field names come from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDetailsData {
    #[serde(default)]
    pub fields: FieldMap,
}

/// Substructure owned by the AddressPurpose stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressPurposeData {
    /// The chosen delivery address.
    #[serde(default)]
    pub address: Option<AddressRecord>,

    /// The chosen industry.
    #[serde(default)]
    pub industry: Option<IndustryRecord>,

    /// Addresses fetched for this buyer, cached for the session.
    #[serde(default)]
    pub cached_addresses: Vec<AddressRecord>,

    /// Industries fetched from the site, cached for the session.
    #[serde(default)]
    pub cached_industries: Vec<IndustryRecord>,

    /// Whether the directory fetch produced usable data.
    #[serde(default)]
    pub directory_fetched: bool,

    /// Whether the stage has already presented its opening list.
    #[serde(default)]
    pub intro_shown: bool,

    /// Whether the transaction has been placed.
    #[serde(default)]
    pub fulfilled: bool,
}

/// The central per-conversation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,

    pub user_auth: UserAuth,

    /// The active stage; exactly one at a time.
    #[serde(default)]
    pub stage: Stage,

    /// Set once during ProductSelection, immutable afterwards.
    #[serde(default)]
    pub request_type: Option<RequestType>,

    /// Confirmed-product snapshot; immutable once set.
    #[serde(default)]
    pub product: Option<ProductSnapshot>,

    #[serde(default)]
    pub details: RequestDetailsData,

    #[serde(default)]
    pub delivery: AddressPurposeData,

    /// Append-only conversation log; never mutated or truncated.
    #[serde(default)]
    pub history: Vec<Exchange>,

    /// Session-owned inventory search cache.
    #[serde(default)]
    pub search_cache: SearchCache,

    /// Refreshed on every persisted write; drives expiry.
    pub last_updated: Timestamp,
}

impl Session {
    /// Creates a fresh session in the initial ProductSelection stage.
    pub fn new(session_id: SessionId, user_auth: UserAuth) -> Self {
        Self {
            session_id,
            user_auth,
            stage: Stage::ProductSelection,
            request_type: None,
            product: None,
            details: RequestDetailsData::default(),
            delivery: AddressPurposeData::default(),
            history: Vec::new(),
            search_cache: SearchCache::default(),
            last_updated: Timestamp::now(),
        }
    }

    /// Appends one (user, assistant) pair to the conversation log.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(Exchange::new(user, assistant));
    }

    /// Returns the most recent `window` exchanges, oldest first.
    pub fn recent_history(&self, window: usize) -> &[Exchange] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    /// Sets the request type chosen during product selection.
    ///
    /// Once set to a value, the type cannot change for the lifetime of the
    /// session; re-confirming the same value is a no-op.
    pub fn set_request_type(&mut self, request_type: RequestType) -> Result<(), ValidationError> {
        match self.request_type {
            Some(existing) if existing != request_type => {
                Err(ValidationError::immutable("request_type"))
            }
            _ => {
                self.request_type = Some(request_type);
                Ok(())
            }
        }
    }

    /// Captures the confirmed product snapshot.
    ///
    /// The snapshot is immutable once set.
    pub fn confirm_product(&mut self, record: ProductRecord) -> Result<(), ValidationError> {
        if self.product.is_some() {
            return Err(ValidationError::immutable("product"));
        }
        self.product = Some(ProductSnapshot::capture(record));
        Ok(())
    }

    /// Refreshes the last-updated timestamp.
    pub fn touch(&mut self) {
        self.last_updated = Timestamp::now();
    }

    /// Returns true if the session has outlived the retention window.
    pub fn is_expired(&self, retention_hours: i64, now: &Timestamp) -> bool {
        now.duration_since(&self.last_updated) > Duration::hours(retention_hours)
    }

    /// Stage expansion for RequestDetails: seeds every required field with
    /// an empty placeholder, then pre-fills the unit from the confirmed
    /// product snapshot so the buyer is not asked for a value the product
    /// already fixes.
    pub fn expand_for_request_details(&mut self) {
        let Some(request_type) = self.request_type else {
            return;
        };

        for spec in catalog().required_fields(request_type, Stage::RequestDetails) {
            self.details
                .fields
                .entry(spec.name.to_string())
                .or_insert_with(|| FieldValue::text(""));
        }

        if let (Some(snapshot), Some(unit_spec)) = (&self.product, catalog().spec(fields::UNIT)) {
            let unit = snapshot.details.unit.trim();
            let canonical = unit_spec
                .options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(unit));
            if let Some(canonical) = canonical {
                self.details
                    .fields
                    .insert(fields::UNIT.to_string(), FieldValue::text(*canonical));
            }
        }
    }

    /// Stage expansion for AddressPurpose: starts the delivery substructure
    /// from a clean slate.
    pub fn expand_for_address_purpose(&mut self) {
        self.delivery = AddressPurposeData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(
            SessionId::new("chat-1").unwrap(),
            UserAuth::new("token-1").unwrap(),
        )
    }

    fn acid() -> ProductRecord {
        ProductRecord {
            id: "p1".to_string(),
            name_en: "Sulfuric Acid".to_string(),
            brand_en: "AcmeChem".to_string(),
            unit: "kg".to_string(),
            min_quantity: Some(10.0),
            available_quantity: Some(100.0),
            price: Some(12.0),
            specification_en: None,
            description_en: None,
        }
    }

    #[test]
    fn new_session_starts_in_product_selection() {
        let session = test_session();
        assert_eq!(session.stage, Stage::ProductSelection);
        assert!(session.request_type.is_none());
        assert!(session.product.is_none());
        assert!(session.history.is_empty());
    }

    #[test]
    fn request_type_is_immutable_once_set() {
        let mut session = test_session();
        session.set_request_type(RequestType::Order).unwrap();

        assert!(session.set_request_type(RequestType::Sample).is_err());
        assert_eq!(session.request_type, Some(RequestType::Order));
    }

    #[test]
    fn re_confirming_the_same_request_type_is_a_no_op() {
        let mut session = test_session();
        session.set_request_type(RequestType::Order).unwrap();
        assert!(session.set_request_type(RequestType::Order).is_ok());
    }

    #[test]
    fn product_snapshot_is_immutable_once_set() {
        let mut session = test_session();
        session.confirm_product(acid()).unwrap();

        let mut other = acid();
        other.id = "p2".to_string();
        assert!(session.confirm_product(other).is_err());
        assert_eq!(session.product.as_ref().unwrap().product_id, "p1");
    }

    #[test]
    fn recent_history_returns_last_window_oldest_first() {
        let mut session = test_session();
        for i in 0..10 {
            session.record_exchange(format!("u{}", i), format!("a{}", i));
        }

        let recent = session.recent_history(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].user, "u4");
        assert_eq!(recent[5].user, "u9");

        // Full log remains intact.
        assert_eq!(session.history.len(), 10);
    }

    #[test]
    fn recent_history_handles_short_logs() {
        let mut session = test_session();
        session.record_exchange("hello", "hi");
        assert_eq!(session.recent_history(6).len(), 1);
    }

    #[test]
    fn expansion_seeds_required_fields_with_placeholders() {
        let mut session = test_session();
        session.set_request_type(RequestType::Ppr).unwrap();
        session.expand_for_request_details();

        assert_eq!(
            session.details.fields.get("quantity"),
            Some(&FieldValue::text(""))
        );
        assert_eq!(
            session.details.fields.get("delivery_date"),
            Some(&FieldValue::text(""))
        );
        // Not required for ppr, so not seeded.
        assert!(!session.details.fields.contains_key("phone"));
    }

    #[test]
    fn expansion_prefills_unit_from_the_snapshot() {
        let mut session = test_session();
        session.set_request_type(RequestType::Order).unwrap();
        session.confirm_product(acid()).unwrap();
        session.expand_for_request_details();

        assert_eq!(
            session.details.fields.get("unit"),
            Some(&FieldValue::text("KG"))
        );
    }

    #[test]
    fn expansion_does_not_clobber_existing_values() {
        let mut session = test_session();
        session.set_request_type(RequestType::Order).unwrap();
        session
            .details
            .fields
            .insert("quantity".to_string(), FieldValue::number(50.0));
        session.expand_for_request_details();

        assert_eq!(
            session.details.fields.get("quantity"),
            Some(&FieldValue::number(50.0))
        );
    }

    #[test]
    fn expansion_without_request_type_is_a_no_op() {
        let mut session = test_session();
        session.expand_for_request_details();
        assert!(session.details.fields.is_empty());
    }

    #[test]
    fn expiry_compares_against_the_retention_window() {
        let mut session = test_session();
        let now = Timestamp::now();

        assert!(!session.is_expired(24, &now));

        session.last_updated = now.minus_hours(25);
        assert!(session.is_expired(24, &now));

        session.last_updated = now.minus_hours(23);
        assert!(!session.is_expired(24, &now));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = test_session();
        session.set_request_type(RequestType::Order).unwrap();
        session.confirm_product(acid()).unwrap();
        session.expand_for_request_details();
        session.record_exchange("I need acid", "Which one?");

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn missing_substructures_default_when_deserializing() {
        // Older records may lack the per-stage substructures entirely.
        let json = r#"{
            "session_id": "chat-1",
            "user_auth": "token-1",
            "stage": "product_selection",
            "last_updated": "2026-01-01T00:00:00Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();

        assert!(session.details.fields.is_empty());
        assert!(session.delivery.cached_addresses.is_empty());
        assert!(session.history.is_empty());
    }
}
