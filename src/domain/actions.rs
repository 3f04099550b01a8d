//! Action schemas and invocation types for the reasoning service.
//!
//! Each stage offers the reasoning service a fixed menu of callable
//! actions. The service may request zero, one, or many of them per turn;
//! the stage handler applies each request and feeds the outcomes back for
//! the final reply.

use serde::{Deserialize, Serialize};

/// Schema and documentation for one callable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Unique action name (e.g., "update_field").
    name: String,

    /// Human-readable description for the reasoning service.
    description: String,

    /// JSON Schema for the arguments.
    parameters_schema: serde_json::Value,
}

impl ActionDef {
    /// Creates a new action definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
        }
    }

    /// Returns the action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters schema.
    pub fn parameters_schema(&self) -> &serde_json::Value {
        &self.parameters_schema
    }

    /// Converts to the chat-completions function-calling format.
    pub fn to_chat_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema
            }
        })
    }
}

/// A request from the reasoning service to invoke an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Name of the requested action.
    name: String,

    /// Arguments for the action (JSON object).
    arguments: serde_json::Value,
}

impl ActionRequest {
    /// Creates a new action request.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Returns the action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments.
    pub fn arguments(&self) -> &serde_json::Value {
        &self.arguments
    }

    /// Returns a string argument by key.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Returns a boolean argument by key.
    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }
}

/// The result of applying one requested action, fed back to the reasoning
/// service before it writes the final reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Name of the action this outcome answers.
    pub action: String,

    /// Result payload (JSON object).
    pub payload: serde_json::Value,
}

impl ActionOutcome {
    /// Creates a new action outcome.
    pub fn new(action: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            action: action.into(),
            payload,
        }
    }

    /// Creates an error outcome with a message.
    pub fn error(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            action,
            serde_json::json!({ "status": "error", "message": message.into() }),
        )
    }

    /// Renders the outcome as text for the follow-up completion round.
    pub fn render(&self) -> String {
        format!("{}: {}", self.action, self.payload)
    }
}

/// Action names shared between the stage handlers and their menus.
pub mod names {
    pub const SEARCH_PRODUCTS: &str = "search_products";
    pub const CONFIRM_SELECTION: &str = "confirm_selection";
    pub const VALIDATE_FIELD: &str = "validate_field";
    pub const UPDATE_FIELD: &str = "update_field";
    pub const CHECK_COMPLETION: &str = "check_completion";
    pub const LIST_INDUSTRIES: &str = "list_industries";
    pub const LIST_ADDRESSES: &str = "list_addresses";
    pub const SELECT_INDUSTRY: &str = "select_industry";
    pub const SELECT_ADDRESS: &str = "select_address";
    pub const FINALIZE_REQUEST: &str = "finalize_request";
}

/// Action menu for the ProductSelection stage.
pub fn product_selection_actions() -> Vec<ActionDef> {
    vec![
        ActionDef::new(
            names::SEARCH_PRODUCTS,
            "Search the inventory for products. Call this whenever the buyer mentions any \
             product, chemical, or material.",
            serde_json::json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Product name or search terms taken from the buyer's message"
                    }
                }
            }),
        ),
        ActionDef::new(
            names::CONFIRM_SELECTION,
            "Record the confirmed product and request type. Call ONLY after the buyer has \
             explicitly confirmed both, and only with a product id from earlier search results.",
            serde_json::json!({
                "type": "object",
                "required": ["product_id", "request_type"],
                "properties": {
                    "product_id": {
                        "type": "string",
                        "description": "Exact id of the confirmed product from search results"
                    },
                    "request_type": {
                        "type": "string",
                        "description": "Confirmed request type",
                        "enum": ["sample", "quotation", "ppr", "order"]
                    }
                }
            }),
        ),
    ]
}

/// Action menu for the RequestDetails stage.
pub fn request_details_actions() -> Vec<ActionDef> {
    vec![
        ActionDef::new(
            names::VALIDATE_FIELD,
            "Check a candidate value against the field's validation rule without storing it.",
            serde_json::json!({
                "type": "object",
                "required": ["field_name", "value"],
                "properties": {
                    "field_name": { "type": "string", "description": "Catalog field name" },
                    "value": { "type": "string", "description": "Candidate value to check" }
                }
            }),
        ),
        ActionDef::new(
            names::UPDATE_FIELD,
            "Validate and store one field value extracted from the buyer's message. Call once \
             per field; extract as many pending fields per message as possible.",
            serde_json::json!({
                "type": "object",
                "required": ["field_name", "value"],
                "properties": {
                    "field_name": { "type": "string", "description": "Catalog field name" },
                    "value": { "type": "string", "description": "Value to validate and store" }
                }
            }),
        ),
        ActionDef::new(
            names::CHECK_COMPLETION,
            "Report which required fields are complete and which are still pending.",
            serde_json::json!({ "type": "object", "properties": {} }),
        ),
    ]
}

/// Action menu for the AddressPurpose stage.
pub fn address_purpose_actions() -> Vec<ActionDef> {
    vec![
        ActionDef::new(
            names::LIST_INDUSTRIES,
            "List the industries fetched from the site. Only real fetched entries are returned.",
            serde_json::json!({ "type": "object", "properties": {} }),
        ),
        ActionDef::new(
            names::LIST_ADDRESSES,
            "List the buyer's saved delivery addresses. Only real fetched entries are returned.",
            serde_json::json!({ "type": "object", "properties": {} }),
        ),
        ActionDef::new(
            names::SELECT_INDUSTRY,
            "Record the industry the buyer chose from the fetched list.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "industry_id": { "type": "string", "description": "Id of the chosen industry" },
                    "industry_name": { "type": "string", "description": "Name of the chosen industry" }
                }
            }),
        ),
        ActionDef::new(
            names::SELECT_ADDRESS,
            "Record the delivery address the buyer chose, by list number, id, or address text.",
            serde_json::json!({
                "type": "object",
                "required": ["selection"],
                "properties": {
                    "selection": {
                        "type": "string",
                        "description": "List number, address id, or a fragment of the address line"
                    }
                }
            }),
        ),
        ActionDef::new(
            names::FINALIZE_REQUEST,
            "Place the request after the buyer explicitly confirms everything.",
            serde_json::json!({
                "type": "object",
                "required": ["confirmed"],
                "properties": {
                    "confirmed": {
                        "type": "boolean",
                        "description": "Whether the buyer explicitly confirmed placing the request"
                    }
                }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_chat_format_has_function_shape() {
        let def = ActionDef::new(
            "search_products",
            "Search inventory",
            serde_json::json!({"type": "object"}),
        );
        let chat = def.to_chat_format();

        assert_eq!(chat["type"], "function");
        assert_eq!(chat["function"]["name"], "search_products");
        assert!(chat["function"]["parameters"].is_object());
    }

    #[test]
    fn action_request_reads_typed_arguments() {
        let request = ActionRequest::new(
            "finalize_request",
            serde_json::json!({"confirmed": true, "note": "go"}),
        );

        assert_eq!(request.bool_arg("confirmed"), Some(true));
        assert_eq!(request.str_arg("note"), Some("go"));
        assert_eq!(request.str_arg("missing"), None);
    }

    #[test]
    fn outcome_render_includes_action_and_payload() {
        let outcome = ActionOutcome::new("update_field", serde_json::json!({"status": "ok"}));
        assert_eq!(outcome.render(), r#"update_field: {"status":"ok"}"#);
    }

    #[test]
    fn error_outcome_carries_the_message() {
        let outcome = ActionOutcome::error("select_address", "no such address");
        assert_eq!(outcome.payload["status"], "error");
        assert_eq!(outcome.payload["message"], "no such address");
    }

    #[test]
    fn each_stage_menu_is_non_empty_and_unique() {
        for menu in [
            product_selection_actions(),
            request_details_actions(),
            address_purpose_actions(),
        ] {
            assert!(!menu.is_empty());
            let mut seen: Vec<&str> = menu.iter().map(|d| d.name()).collect();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), menu.len());
        }
    }

    #[test]
    fn confirm_selection_schema_restricts_request_types() {
        let menu = product_selection_actions();
        let confirm = menu
            .iter()
            .find(|d| d.name() == names::CONFIRM_SELECTION)
            .unwrap();
        let enumeration = &confirm.parameters_schema()["properties"]["request_type"]["enum"];
        assert_eq!(enumeration.as_array().unwrap().len(), 4);
    }
}
