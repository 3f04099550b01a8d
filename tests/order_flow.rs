//! End-to-end conversation flow over the public `handle_turn` boundary,
//! with every external collaborator mocked.

use std::sync::Arc;

use falcon_assist::adapters::ai::MockReasoning;
use falcon_assist::adapters::lookup::{
    RecordingOrderPlacement, StaticDirectory, StaticProductLookup,
};
use falcon_assist::adapters::store::InMemorySessionStore;
use falcon_assist::application::{Assistant, AssistantConfig, APOLOGY_REPLY};
use falcon_assist::domain::actions::{names, ActionRequest};
use falcon_assist::domain::completion::FieldValue;
use falcon_assist::domain::foundation::{SessionId, UserAuth};
use falcon_assist::domain::session::{
    AddressRecord, IndustryRecord, ProductRecord, RequestType, Stage,
};
use falcon_assist::ports::{Completion, SessionStore};

fn sulfuric_acid() -> ProductRecord {
    ProductRecord {
        id: "prod-acid-1".to_string(),
        name_en: "Sulfuric Acid".to_string(),
        brand_en: "AcmeChem".to_string(),
        unit: "KG".to_string(),
        min_quantity: Some(10.0),
        available_quantity: Some(100.0),
        price: Some(12.0),
        specification_en: Some("98% technical grade".to_string()),
        description_en: None,
    }
}

fn warehouse_address() -> AddressRecord {
    AddressRecord {
        id: "addr-1".to_string(),
        address_line: "12 Industrial Rd".to_string(),
        name: "Main Warehouse".to_string(),
        email: "ops@example.com".to_string(),
        phone_number: "+971501234567".to_string(),
        country_code: "AE".to_string(),
        city: "Dubai".to_string(),
        state: String::new(),
        country: "UAE".to_string(),
        latitude: String::new(),
        longitude: String::new(),
    }
}

fn water_treatment() -> IndustryRecord {
    IndustryRecord {
        id: "ind-1".to_string(),
        name_en: "Water Treatment".to_string(),
    }
}

fn session_id() -> SessionId {
    SessionId::new("e2e-chat").unwrap()
}

fn auth() -> UserAuth {
    UserAuth::new("buyer-token").unwrap()
}

fn action(name: &str, args: serde_json::Value) -> ActionRequest {
    ActionRequest::new(name, args)
}

/// Scripts the reasoning mock for the first three turns (through the
/// completion of request details).
fn scripted_through_details() -> MockReasoning {
    MockReasoning::new()
        // Turn 1: the buyer mentions a product; the provider searches.
        .with_completion(Completion::with_actions(
            "",
            [action(
                names::SEARCH_PRODUCTS,
                serde_json::json!({"query": "sulfuric acid"}),
            )],
        ))
        .with_reply("I found 1. Sulfuric Acid by AcmeChem. Which request type do you need?")
        // Turn 2: explicit confirmation of product and request type.
        .with_completion(Completion::with_actions(
            "",
            [action(
                names::CONFIRM_SELECTION,
                serde_json::json!({"product_id": "prod-acid-1", "request_type": "order"}),
            )],
        ))
        .with_reply("Confirmed: Sulfuric Acid as an order. Let's collect the details.")
        // Turn 3: bulk extraction of every remaining field in one message.
        .with_completion(Completion::with_actions(
            "",
            [
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "quantity", "value": "50"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "price_per_unit", "value": "12.5"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "phone", "value": "+1234567890"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "incoterm", "value": "Ex Factory"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "mode_of_payment", "value": "TT"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "packaging_pref", "value": "Drum"})),
                action(names::UPDATE_FIELD, serde_json::json!({"field_name": "delivery_date", "value": "2999-12-31"})),
            ],
        ))
        .with_reply("Everything checks out. Next, delivery address and industry.")
}

/// Scripts the full four-turn order conversation.
fn scripted_reasoning() -> MockReasoning {
    scripted_through_details()
        // Turn 4: pick industry and address, then finalize.
        .with_completion(Completion::with_actions(
            "",
            [
                action(names::SELECT_INDUSTRY, serde_json::json!({"industry_id": "ind-1", "industry_name": "Water Treatment"})),
                action(names::SELECT_ADDRESS, serde_json::json!({"selection": "1"})),
                action(names::FINALIZE_REQUEST, serde_json::json!({"confirmed": true})),
            ],
        ))
        .with_reply("Your order has been placed. Thank you!")
}

fn build_assistant(
    reasoning: MockReasoning,
    store: Arc<InMemorySessionStore>,
    orders: Arc<RecordingOrderPlacement>,
) -> Assistant {
    Assistant::new(
        store,
        Arc::new(reasoning),
        Arc::new(StaticProductLookup::new(vec![sulfuric_acid()])),
        Arc::new(StaticDirectory::new(
            vec![warehouse_address()],
            vec![water_treatment()],
        )),
        orders,
        AssistantConfig::default(),
    )
}

#[tokio::test]
async fn full_order_conversation_reaches_fulfillment() {
    let store = Arc::new(InMemorySessionStore::new());
    let orders = Arc::new(RecordingOrderPlacement::succeeding("ord-777"));
    let assistant = build_assistant(scripted_reasoning(), Arc::clone(&store), Arc::clone(&orders));

    // Turn 1: search and presentation; still in product selection.
    let reply = assistant
        .handle_turn(session_id(), auth(), "I need sulfuric acid")
        .await;
    assert!(reply.contains("Sulfuric Acid"));
    let session = store.load(&session_id()).await.unwrap().unwrap();
    assert_eq!(session.stage, Stage::ProductSelection);
    assert!(session.search_cache.get("sulfuric acid").is_some());

    // Turn 2: confirmation hands over to request details with expanded fields.
    assistant
        .handle_turn(session_id(), auth(), "Confirm Sulfuric Acid as an order")
        .await;
    let session = store.load(&session_id()).await.unwrap().unwrap();
    assert_eq!(session.stage, Stage::RequestDetails);
    assert_eq!(session.request_type, Some(RequestType::Order));
    assert_eq!(
        session.product.as_ref().unwrap().product_name,
        "Sulfuric Acid"
    );
    // Placeholders seeded; unit pre-filled from the snapshot.
    assert_eq!(
        session.details.fields.get("unit"),
        Some(&FieldValue::text("KG"))
    );
    assert_eq!(
        session.details.fields.get("quantity"),
        Some(&FieldValue::text(""))
    );

    // Turn 3: one bulk message completes the stage and derives the price.
    assistant
        .handle_turn(
            session_id(),
            auth(),
            "Quantity 50 at 12.5 per unit, phone +1234567890, Ex Factory, TT, Drum, 2999-12-31",
        )
        .await;
    let session = store.load(&session_id()).await.unwrap().unwrap();
    assert_eq!(session.stage, Stage::AddressPurpose);
    assert_eq!(
        session.details.fields.get("quantity"),
        Some(&FieldValue::number(50.0))
    );
    assert_eq!(
        session.details.fields.get("expected_price"),
        Some(&FieldValue::number(625.0))
    );
    assert_eq!(
        session.details.fields.get("incoterm"),
        Some(&FieldValue::text("Ex Factory"))
    );

    // Turn 4: industry + address + explicit confirmation places the order.
    let reply = assistant
        .handle_turn(session_id(), auth(), "Water treatment, address 1, yes place it")
        .await;
    assert!(reply.contains("placed"));

    let session = store.load(&session_id()).await.unwrap().unwrap();
    assert!(session.delivery.fulfilled);
    assert_eq!(
        session.delivery.address.as_ref().unwrap().id,
        "addr-1"
    );
    assert_eq!(
        session.delivery.industry.as_ref().unwrap().name_en,
        "Water Treatment"
    );
    assert_eq!(orders.placed_count(), 1);

    // The placed session carried the validated fields.
    let placed = orders.placed_sessions();
    assert_eq!(
        placed[0].details.fields.get("expected_price"),
        Some(&FieldValue::number(625.0))
    );

    // Full history retained, one exchange per turn.
    assert_eq!(session.history.len(), 4);
}

#[tokio::test]
async fn replaying_a_no_op_turn_does_not_change_stored_fields() {
    let store = Arc::new(InMemorySessionStore::new());
    let orders = Arc::new(RecordingOrderPlacement::succeeding("ord-777"));
    let assistant = build_assistant(
        scripted_through_details().with_default_reply("Anything else?"),
        Arc::clone(&store),
        Arc::clone(&orders),
    );

    for text in [
        "I need sulfuric acid",
        "Confirm Sulfuric Acid as an order",
        "Quantity 50 at 12.5 per unit, phone +1234567890, Ex Factory, TT, Drum, 2999-12-31",
    ] {
        assistant.handle_turn(session_id(), auth(), text).await;
    }
    let before = store.load(&session_id()).await.unwrap().unwrap();

    // The script is exhausted, so the empty message produces a plain reply
    // with no requested actions.
    let reply = assistant.handle_turn(session_id(), auth(), "").await;
    assert_ne!(reply, APOLOGY_REPLY);

    let after = store.load(&session_id()).await.unwrap().unwrap();
    // Stored field values from the satisfied stage are untouched.
    assert_eq!(after.details.fields, before.details.fields);
    assert_eq!(after.request_type, before.request_type);
    assert_eq!(after.product, before.product);
}

#[tokio::test]
async fn failed_order_placement_keeps_the_session_unfulfilled() {
    let store = Arc::new(InMemorySessionStore::new());
    let orders = Arc::new(RecordingOrderPlacement::failing("insufficient stock"));
    let assistant = build_assistant(scripted_reasoning(), Arc::clone(&store), Arc::clone(&orders));

    for text in [
        "I need sulfuric acid",
        "Confirm Sulfuric Acid as an order",
        "Quantity 50 at 12.5 per unit, phone +1234567890, Ex Factory, TT, Drum, 2999-12-31",
        "Water treatment, address 1, yes place it",
    ] {
        assistant.handle_turn(session_id(), auth(), text).await;
    }

    let session = store.load(&session_id()).await.unwrap().unwrap();
    assert!(!session.delivery.fulfilled);
    assert_eq!(orders.placed_count(), 0);
    // Selections survive the failed placement for a later retry.
    assert!(session.delivery.address.is_some());
    assert!(session.delivery.industry.is_some());
}
