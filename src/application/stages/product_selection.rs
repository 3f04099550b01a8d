//! Product Selection stage handler.
//!
//! First phase of the conversation: search the inventory from the buyer's
//! free text, present only products the lookup actually returned, and wait
//! for an explicit confirmation of exactly one product plus one request
//! type before handing over to request details.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::actions::{self, names, ActionOutcome, ActionRequest};
use crate::domain::foundation::StateMachine;
use crate::domain::session::{ProductRecord, RequestType, Session, Stage};
use crate::ports::{CompletionRequest, ProductLookup, ReasoningService};

use super::{
    conversation_messages, ensure_reply, follow_up, StageError, StageOutcome,
    FIRST_ROUND_MAX_TOKENS,
};

/// Handler for the ProductSelection stage.
pub struct ProductSelectionStage {
    reasoning: Arc<dyn ReasoningService>,
    products: Arc<dyn ProductLookup>,
    history_window: usize,
}

impl ProductSelectionStage {
    /// Creates the handler with its collaborating ports.
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        products: Arc<dyn ProductLookup>,
        history_window: usize,
    ) -> Self {
        Self {
            reasoning,
            products,
            history_window,
        }
    }

    /// Handles one turn in the ProductSelection stage.
    pub async fn respond(
        &self,
        input: &str,
        mut session: Session,
    ) -> Result<StageOutcome, StageError> {
        let messages = conversation_messages(
            self.instruction(&session),
            &session,
            input,
            self.history_window,
        );

        let first = self
            .reasoning
            .complete(
                CompletionRequest::new()
                    .with_messages(messages.clone())
                    .with_actions(actions::product_selection_actions())
                    .with_max_tokens(FIRST_ROUND_MAX_TOKENS),
            )
            .await?;

        if !first.has_actions() {
            let reply = ensure_reply(first.reply, "");
            return Ok(StageOutcome { reply, session });
        }

        let mut outcomes = Vec::with_capacity(first.requested.len());
        for request in &first.requested {
            let outcome = match request.name() {
                names::SEARCH_PRODUCTS => self.search(request, &mut session).await,
                names::CONFIRM_SELECTION => self.confirm(request, &mut session),
                other => ActionOutcome::error(other, "unknown action"),
            };
            outcomes.push(outcome);
        }

        let reply = follow_up(self.reasoning.as_ref(), messages, &first, &outcomes).await?;
        Ok(StageOutcome { reply, session })
    }

    /// Runs an inventory search, serving the session cache when it holds
    /// usable results for the same query.
    async fn search(&self, request: &ActionRequest, session: &mut Session) -> ActionOutcome {
        let Some(query) = request.str_arg("query") else {
            return ActionOutcome::error(names::SEARCH_PRODUCTS, "missing 'query' argument");
        };

        if let Some(cached) = session.search_cache.get(query) {
            debug!(query, hits = cached.len(), "serving product search from session cache");
            return ActionOutcome::new(names::SEARCH_PRODUCTS, products_payload(cached));
        }

        match self.products.search(query).await {
            Ok(records) => {
                let total = records.len();
                let usable: Vec<ProductRecord> = records
                    .into_iter()
                    .filter(ProductRecord::has_allowed_unit)
                    .collect();
                debug!(query, total, usable = usable.len(), "inventory search completed");

                // Zero-usable-result queries stay uncached so they are retried.
                session.search_cache.put(query, usable.clone());
                ActionOutcome::new(names::SEARCH_PRODUCTS, products_payload(&usable))
            }
            Err(err) => {
                warn!(query, error = %err, "inventory search failed");
                ActionOutcome::error(
                    names::SEARCH_PRODUCTS,
                    format!("inventory search failed: {}", err),
                )
            }
        }
    }

    /// Records the confirmed product and request type and hands the session
    /// over to request details.
    ///
    /// Only products present in the session's search cache can be confirmed:
    /// anything else was never returned by the lookup.
    fn confirm(&self, request: &ActionRequest, session: &mut Session) -> ActionOutcome {
        let Some(product_id) = request.str_arg("product_id") else {
            return ActionOutcome::error(names::CONFIRM_SELECTION, "missing 'product_id' argument");
        };
        let Some(raw_type) = request.str_arg("request_type") else {
            return ActionOutcome::error(names::CONFIRM_SELECTION, "missing 'request_type' argument");
        };

        let request_type: RequestType = match raw_type.parse() {
            Ok(rt) => rt,
            Err(err) => return ActionOutcome::error(names::CONFIRM_SELECTION, err.to_string()),
        };

        let Some(record) = session.search_cache.find_product(product_id).cloned() else {
            return ActionOutcome::error(
                names::CONFIRM_SELECTION,
                format!(
                    "product '{}' was not returned by any search; only listed products can be confirmed",
                    product_id
                ),
            );
        };

        if let Err(err) = session.set_request_type(request_type) {
            return ActionOutcome::error(names::CONFIRM_SELECTION, err.to_string());
        }
        if let Err(err) = session.confirm_product(record.clone()) {
            return ActionOutcome::error(names::CONFIRM_SELECTION, err.to_string());
        }
        session.stage = match session.stage.transition_to(Stage::RequestDetails) {
            Ok(stage) => stage,
            Err(err) => return ActionOutcome::error(names::CONFIRM_SELECTION, err.to_string()),
        };

        info!(
            product_id,
            product = %record.name_en,
            request_type = %request_type,
            "product confirmed, handing over to request details"
        );

        ActionOutcome::new(
            names::CONFIRM_SELECTION,
            serde_json::json!({
                "status": "success",
                "product_id": record.id,
                "product_name": record.name_en,
                "request_type": request_type.as_str(),
                "handover": Stage::RequestDetails,
            }),
        )
    }

    fn instruction(&self, session: &Session) -> String {
        format!(
            "You are the product selection specialist, the first of three steps in a buying \
             conversation.\n\
             Your job ends once the buyer has explicitly confirmed one product and one request \
             type (sample, quotation, ppr, or order).\n\n\
             Rules:\n\
             - When the buyer mentions any product or material, call {search} with their terms.\n\
             - Present products as a numbered list of name and brand. Never invent products: only \
               items returned by {search} exist.\n\
             - If a search returns nothing, say so and ask the buyer to try different terms.\n\
             - Before calling {confirm}, restate the chosen product and request type and get an \
               explicit yes.\n\
             - Call {confirm} exactly once, with the product id from the search results.\n\n\
             Session so far: request_type={request_type}, product={product}.",
            search = names::SEARCH_PRODUCTS,
            confirm = names::CONFIRM_SELECTION,
            request_type = session
                .request_type
                .map(|rt| rt.as_str())
                .unwrap_or("not chosen yet"),
            product = session
                .product
                .as_ref()
                .map(|p| p.product_name.as_str())
                .unwrap_or("not chosen yet"),
        )
    }
}

/// Renders a numbered product list for the reasoning service.
fn products_payload(products: &[ProductRecord]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            serde_json::json!({
                "number": i + 1,
                "id": p.id,
                "name": p.name_en,
                "brand": p.brand_en,
                "unit": p.unit,
                "min_quantity": p.min_quantity,
                "available_quantity": p.available_quantity,
                "price": p.price,
            })
        })
        .collect();

    serde_json::json!({
        "status": "success",
        "count": rows.len(),
        "products": rows,
    })
}
