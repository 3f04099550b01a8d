//! Request Details stage handler.
//!
//! Second phase: collect and validate every field the request type
//! requires. The handler bulk-extracts as many pending values per message
//! as the reasoning service proposes, stores only values that pass their
//! validator, derives the expected price, and hands over once the full
//! required set is satisfied.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::actions::{self, names, ActionOutcome, ActionRequest};
use crate::domain::catalog::{catalog, fields, FieldKind, FieldSpec};
use crate::domain::completion::{
    calculate_expected_price, completed_fields, is_stage_satisfied, pending_fields,
    validate_future_date, validate_phone, validate_positive_number, validate_quantity,
    validate_selection, FieldValue, QuantityBounds, Verdict,
};
use crate::domain::foundation::StateMachine;
use crate::domain::session::{RequestType, Session, Stage};
use crate::ports::{CompletionRequest, ReasoningService};

use super::{
    conversation_messages, ensure_reply, follow_up, StageError, StageOutcome,
    FIRST_ROUND_MAX_TOKENS,
};

/// Handler for the RequestDetails stage.
pub struct RequestDetailsStage {
    reasoning: Arc<dyn ReasoningService>,
    history_window: usize,
}

impl RequestDetailsStage {
    /// Creates the handler.
    pub fn new(reasoning: Arc<dyn ReasoningService>, history_window: usize) -> Self {
        Self {
            reasoning,
            history_window,
        }
    }

    /// Handles one turn in the RequestDetails stage.
    pub async fn respond(
        &self,
        input: &str,
        mut session: Session,
    ) -> Result<StageOutcome, StageError> {
        let request_type = session.request_type.ok_or(StageError::MissingRequestType)?;
        let required = catalog().required_fields(request_type, Stage::RequestDetails);

        let messages = conversation_messages(
            self.instruction(&session, request_type, &required),
            &session,
            input,
            self.history_window,
        );

        let first = self
            .reasoning
            .complete(
                CompletionRequest::new()
                    .with_messages(messages.clone())
                    .with_actions(actions::request_details_actions())
                    .with_max_tokens(FIRST_ROUND_MAX_TOKENS),
            )
            .await?;

        let mut outcomes = Vec::with_capacity(first.requested.len());
        for request in &first.requested {
            let outcome = match request.name() {
                names::VALIDATE_FIELD => self.validate(request, &session),
                names::UPDATE_FIELD => self.update(request, &mut session),
                names::CHECK_COMPLETION => completion_status(&session, &required),
                other => ActionOutcome::error(other, "unknown action"),
            };
            outcomes.push(outcome);
        }

        refresh_expected_price(&mut session);

        // Handover the moment the full required set is satisfied.
        if session.stage == Stage::RequestDetails
            && is_stage_satisfied(&session.details.fields, &required)
        {
            session.stage = session.stage.transition_to(Stage::AddressPurpose)?;
            info!(request_type = %request_type, "all fields complete, handing over to address & purpose");
            outcomes.push(ActionOutcome::new(
                names::CHECK_COMPLETION,
                serde_json::json!({
                    "all_completed": true,
                    "handover": Stage::AddressPurpose,
                }),
            ));
        }

        let reply = if outcomes.is_empty() {
            ensure_reply(first.reply, "")
        } else {
            follow_up(self.reasoning.as_ref(), messages, &first, &outcomes).await?
        };

        Ok(StageOutcome { reply, session })
    }

    /// Checks a candidate value without storing it.
    fn validate(&self, request: &ActionRequest, session: &Session) -> ActionOutcome {
        let (spec, raw) = match field_args(request) {
            Ok(pair) => pair,
            Err(outcome) => return outcome,
        };

        let verdict = verdict_for(spec, raw, session);
        ActionOutcome::new(
            names::VALIDATE_FIELD,
            serde_json::json!({
                "field_name": spec.name,
                "valid": verdict.valid,
                "message": verdict.reason,
            }),
        )
    }

    /// Validates a value and stores it when it passes.
    ///
    /// Bulk extraction lands several of these per turn; every one of them
    /// goes through its validator before anything is written.
    fn update(&self, request: &ActionRequest, session: &mut Session) -> ActionOutcome {
        let (spec, raw) = match field_args(request) {
            Ok(pair) => pair,
            Err(outcome) => return outcome,
        };

        let verdict = verdict_for(spec, raw, session);
        if !verdict.valid {
            debug!(field = spec.name, value = raw, reason = %verdict.reason, "field value rejected");
            return ActionOutcome::new(
                names::UPDATE_FIELD,
                serde_json::json!({
                    "field_name": spec.name,
                    "valid": false,
                    "message": verdict.reason,
                }),
            );
        }

        let stored = verdict
            .normalized
            .unwrap_or_else(|| FieldValue::text(raw));
        debug!(field = spec.name, value = %stored, "field value stored");
        session
            .details
            .fields
            .insert(spec.name.to_string(), stored.clone());

        ActionOutcome::new(
            names::UPDATE_FIELD,
            serde_json::json!({
                "field_name": spec.name,
                "valid": true,
                "stored_value": stored,
            }),
        )
    }

    fn instruction(
        &self,
        session: &Session,
        request_type: RequestType,
        required: &[&'static FieldSpec],
    ) -> String {
        let completed = completed_fields(&session.details.fields, required);
        let pending = pending_fields(&session.details.fields, required);

        let field_lines: String = required
            .iter()
            .map(|spec| {
                if spec.is_selection() {
                    format!("- {}: {} ({})\n", spec.name, spec.description, spec.options.join(", "))
                } else {
                    format!("- {}: {}\n", spec.name, spec.description)
                }
            })
            .collect();

        let progress_lines: String = completed
            .iter()
            .map(|spec| {
                let value = session
                    .details
                    .fields
                    .get(spec.name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                format!("  done {}: {}\n", spec.name, value)
            })
            .chain(
                pending
                    .iter()
                    .map(|spec| format!("  missing {}\n", spec.name)),
            )
            .collect();

        let (product_name, min_quantity, available) = match &session.product {
            Some(snapshot) => (
                snapshot.product_name.clone(),
                snapshot
                    .details
                    .min_quantity
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "1".to_string()),
                snapshot
                    .details
                    .available_quantity
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "unlimited".to_string()),
            ),
            None => ("unknown".to_string(), "1".to_string(), "unlimited".to_string()),
        };

        format!(
            "You are the request details specialist, collecting everything needed for a {rt} \
             request for {product} (minimum order {min}, available {max}).\n\n\
             Required fields:\n{fields}\n\
             Progress ({done}/{total} complete):\n{progress}\n\
             Rules:\n\
             - Extract every field value you can find in each buyer message and call {update} \
               once per field.\n\
             - Selections must come from the listed options; dates use YYYY-MM-DD and must be \
               in the future.\n\
             - The expected price is computed automatically from quantity and price per unit; \
               never ask for it.\n\
             - When a value is rejected, relay the reason and ask for a corrected value.\n\
             - Use {check} to report progress when the buyer asks where things stand.",
            rt = request_type,
            product = product_name,
            min = min_quantity,
            max = available,
            fields = field_lines,
            done = completed.len(),
            total = required.len(),
            progress = progress_lines,
            update = names::UPDATE_FIELD,
            check = names::CHECK_COMPLETION,
        )
    }
}

/// Extracts and resolves the (field_name, value) argument pair.
fn field_args<'a>(
    request: &'a ActionRequest,
) -> Result<(&'static FieldSpec, &'a str), ActionOutcome> {
    let Some(name) = request.str_arg("field_name") else {
        return Err(ActionOutcome::error(
            request.name(),
            "missing 'field_name' argument",
        ));
    };
    let Some(spec) = catalog().spec(name) else {
        return Err(ActionOutcome::error(
            request.name(),
            format!("unknown field '{}'", name),
        ));
    };
    let Some(raw) = request.str_arg("value") else {
        return Err(ActionOutcome::error(
            request.name(),
            "missing 'value' argument",
        ));
    };
    Ok((spec, raw))
}

/// Routes a raw value to the validator for its field kind.
fn verdict_for(spec: &'static FieldSpec, raw: &str, session: &Session) -> Verdict {
    match spec.kind {
        FieldKind::Number if spec.name == fields::QUANTITY => {
            let bounds = session
                .product
                .as_ref()
                .map(|snapshot| {
                    QuantityBounds::new(
                        snapshot.details.min_quantity,
                        snapshot.details.available_quantity,
                    )
                })
                .unwrap_or_default();
            validate_quantity(raw, &bounds)
        }
        FieldKind::Number => validate_positive_number(raw),
        FieldKind::Phone => validate_phone(raw),
        FieldKind::Date => validate_future_date(raw),
        FieldKind::Select => validate_selection(spec, raw),
        FieldKind::Calculated => {
            Verdict::rejected(format!("'{}' is computed automatically", spec.name))
        }
    }
}

/// Recomputes the expected price whenever quantity and price per unit both
/// hold usable values.
fn refresh_expected_price(session: &mut Session) {
    let quantity = session.details.fields.get(fields::QUANTITY);
    let price = session.details.fields.get(fields::PRICE_PER_UNIT);

    let (Some(quantity), Some(price)) = (quantity, price) else {
        return;
    };
    if quantity.is_empty_sentinel() || price.is_empty_sentinel() {
        return;
    }

    let verdict = calculate_expected_price(quantity, price);
    if let Some(total) = verdict.normalized {
        session
            .details
            .fields
            .insert(fields::EXPECTED_PRICE.to_string(), total);
    } else {
        warn!(reason = %verdict.reason, "expected price could not be derived");
    }
}

/// Builds the completion-status payload for the reasoning service.
fn completion_status(session: &Session, required: &[&'static FieldSpec]) -> ActionOutcome {
    let completed = completed_fields(&session.details.fields, required);
    let pending = pending_fields(&session.details.fields, required);

    ActionOutcome::new(
        names::CHECK_COMPLETION,
        serde_json::json!({
            "all_completed": pending.is_empty(),
            "completed_count": completed.len(),
            "total_required": required.len(),
            "pending_fields": pending.iter().map(|s| s.name).collect::<Vec<_>>(),
        }),
    )
}
