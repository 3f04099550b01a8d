//! Address & Purpose stage handler.
//!
//! Terminal phase: fetch the buyer's saved addresses and the site's
//! industries once per session, let the buyer pick from the real entries,
//! and place the request when they explicitly confirm.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::actions::{self, names, ActionOutcome, ActionRequest};
use crate::domain::catalog::{catalog, fields};
use crate::domain::session::{AddressRecord, Session, Stage};
use crate::ports::{
    CompletionRequest, DirectoryService, Message, OrderPlacement, ReasoningService,
};

use super::{
    conversation_messages, ensure_reply, follow_up, StageError, StageOutcome,
    FIRST_ROUND_MAX_TOKENS,
};

/// Reply used when neither addresses nor industries could be fetched.
const DIRECTORY_UNAVAILABLE_REPLY: &str =
    "I apologize, but I'm unable to fetch your addresses and the industry list at the \
     moment. Please try again later.";

/// Handler for the AddressPurpose stage.
pub struct AddressPurposeStage {
    reasoning: Arc<dyn ReasoningService>,
    directory: Arc<dyn DirectoryService>,
    orders: Arc<dyn OrderPlacement>,
    history_window: usize,
}

impl AddressPurposeStage {
    /// Creates the handler with its collaborating ports.
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        directory: Arc<dyn DirectoryService>,
        orders: Arc<dyn OrderPlacement>,
        history_window: usize,
    ) -> Self {
        Self {
            reasoning,
            directory,
            orders,
            history_window,
        }
    }

    /// Handles one turn in the AddressPurpose stage.
    pub async fn respond(
        &self,
        input: &str,
        mut session: Session,
    ) -> Result<StageOutcome, StageError> {
        if session.request_type.is_none() {
            return Err(StageError::MissingRequestType);
        }

        if !session.delivery.directory_fetched {
            self.fetch_directory(&mut session).await;
            if session.delivery.cached_addresses.is_empty()
                && session.delivery.cached_industries.is_empty()
            {
                // Leave the fetched flag unset so the next turn retries.
                return Ok(StageOutcome {
                    reply: DIRECTORY_UNAVAILABLE_REPLY.to_string(),
                    session,
                });
            }
        }

        let mut messages = conversation_messages(
            self.instruction(&session),
            &session,
            input,
            self.history_window,
        );

        // Open the stage by presenting the fetched industries unprompted.
        if !session.delivery.intro_shown && !session.delivery.cached_industries.is_empty() {
            session.delivery.intro_shown = true;
            let nudge = Message::system(
                "The buyer just arrived at this step. Present the fetched industries as a \
                 numbered list right away and ask them to pick one.",
            );
            let last = messages.len() - 1;
            messages.insert(last, nudge);
        }

        let first = self
            .reasoning
            .complete(
                CompletionRequest::new()
                    .with_messages(messages.clone())
                    .with_actions(actions::address_purpose_actions())
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
                names::LIST_INDUSTRIES => list_industries(&session),
                names::LIST_ADDRESSES => list_addresses(&session),
                names::SELECT_INDUSTRY => select_industry(request, &mut session),
                names::SELECT_ADDRESS => select_address(request, input, &mut session),
                names::FINALIZE_REQUEST => self.finalize(request, &mut session).await,
                other => ActionOutcome::error(other, "unknown action"),
            };
            outcomes.push(outcome);
        }

        let reply = follow_up(self.reasoning.as_ref(), messages, &first, &outcomes).await?;
        Ok(StageOutcome { reply, session })
    }

    /// Fetches addresses and industries once and caches them in the session.
    ///
    /// Individual fetch failures degrade to empty lists; the flag is only
    /// set when at least one list has data, so a fully failed fetch is
    /// retried on the next turn.
    async fn fetch_directory(&self, session: &mut Session) {
        let addresses = match self.directory.addresses_for(&session.user_auth).await {
            Ok(addresses) => addresses,
            Err(err) => {
                warn!(error = %err, "address fetch failed");
                Vec::new()
            }
        };
        let industries = match self.directory.industries().await {
            Ok(industries) => industries,
            Err(err) => {
                warn!(error = %err, "industry fetch failed");
                Vec::new()
            }
        };

        debug!(
            addresses = addresses.len(),
            industries = industries.len(),
            "directory fetched"
        );

        if !addresses.is_empty() || !industries.is_empty() {
            session.delivery.directory_fetched = true;
        }
        session.delivery.cached_addresses = addresses;
        session.delivery.cached_industries = industries;
    }

    /// Places the request once the buyer has explicitly confirmed.
    async fn finalize(&self, request: &ActionRequest, session: &mut Session) -> ActionOutcome {
        if request.bool_arg("confirmed") != Some(true) {
            return ActionOutcome::error(
                names::FINALIZE_REQUEST,
                "buyer confirmation is required before placing the request",
            );
        }
        if session.delivery.fulfilled {
            return ActionOutcome::error(names::FINALIZE_REQUEST, "request already placed");
        }
        if session.delivery.address.is_none() {
            return ActionOutcome::error(names::FINALIZE_REQUEST, "no delivery address selected");
        }
        if industry_required(session) && session.delivery.industry.is_none() {
            return ActionOutcome::error(names::FINALIZE_REQUEST, "no industry selected");
        }

        match self.orders.place(session).await {
            Ok(receipt) => {
                session.delivery.fulfilled = true;
                info!(order_id = ?receipt.order_id, "request placed");
                ActionOutcome::new(
                    names::FINALIZE_REQUEST,
                    serde_json::json!({
                        "status": "success",
                        "order_id": receipt.order_id,
                        "message": receipt.message,
                    }),
                )
            }
            Err(err) => {
                warn!(error = %err, "order placement failed");
                ActionOutcome::error(
                    names::FINALIZE_REQUEST,
                    format!("order placement failed: {}", err),
                )
            }
        }
    }

    fn instruction(&self, session: &Session) -> String {
        let chosen_address = session
            .delivery
            .address
            .as_ref()
            .map(|a| a.address_line.clone())
            .unwrap_or_else(|| "not chosen yet".to_string());
        let chosen_industry = session
            .delivery
            .industry
            .as_ref()
            .map(|i| i.name_en.clone())
            .unwrap_or_else(|| "not chosen yet".to_string());

        format!(
            "You are the delivery specialist, the final step of the buying conversation.\n\
             Collect the delivery address{industry_part} and, after an explicit confirmation, \
             place the request with {finalize}.\n\n\
             Rules:\n\
             - Only offer entries from {list_addresses} and {list_industries}; never invent \
               addresses or industries.\n\
             - Record choices with {select_address} and {select_industry}.\n\
             - Before calling {finalize}, show the full summary (product, request type, \
               collected fields, address{industry_part}) and get an explicit yes.\n\n\
             Chosen so far: address={address}, industry={industry}.",
            industry_part = if industry_required(session) {
                " and the buyer's industry"
            } else {
                ""
            },
            finalize = names::FINALIZE_REQUEST,
            list_addresses = names::LIST_ADDRESSES,
            list_industries = names::LIST_INDUSTRIES,
            select_address = names::SELECT_ADDRESS,
            select_industry = names::SELECT_INDUSTRY,
            address = chosen_address,
            industry = chosen_industry,
        )
    }
}

/// Whether the session's request type makes the industry mandatory.
fn industry_required(session: &Session) -> bool {
    session
        .request_type
        .map(|rt| {
            catalog()
                .required_fields(rt, Stage::AddressPurpose)
                .iter()
                .any(|spec| spec.name == fields::INDUSTRY)
        })
        .unwrap_or(false)
}

fn list_industries(session: &Session) -> ActionOutcome {
    let industries = &session.delivery.cached_industries;
    if industries.is_empty() {
        return ActionOutcome::error(names::LIST_INDUSTRIES, "no industries available");
    }

    let rows: Vec<serde_json::Value> = industries
        .iter()
        .enumerate()
        .map(|(i, industry)| {
            serde_json::json!({
                "number": i + 1,
                "id": industry.id,
                "name": industry.name_en,
            })
        })
        .collect();

    ActionOutcome::new(
        names::LIST_INDUSTRIES,
        serde_json::json!({ "status": "success", "count": rows.len(), "industries": rows }),
    )
}

fn list_addresses(session: &Session) -> ActionOutcome {
    let addresses = &session.delivery.cached_addresses;
    if addresses.is_empty() {
        return ActionOutcome::error(names::LIST_ADDRESSES, "no addresses available");
    }

    let rows: Vec<serde_json::Value> = addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            serde_json::json!({
                "number": i + 1,
                "id": address.id,
                "address_line": address.address_line,
                "city": address.city,
                "country": address.country,
            })
        })
        .collect();

    ActionOutcome::new(
        names::LIST_ADDRESSES,
        serde_json::json!({ "status": "success", "count": rows.len(), "addresses": rows }),
    )
}

fn select_industry(request: &ActionRequest, session: &mut Session) -> ActionOutcome {
    let id = request.str_arg("industry_id");
    let name = request.str_arg("industry_name");

    let chosen = session
        .delivery
        .cached_industries
        .iter()
        .find(|industry| {
            id.is_some_and(|wanted| industry.id == wanted)
                || name.is_some_and(|wanted| industry.name_en.eq_ignore_ascii_case(wanted.trim()))
        })
        .cloned();

    match chosen {
        Some(industry) => {
            debug!(industry = %industry.name_en, "industry selected");
            let payload = serde_json::json!({
                "status": "success",
                "industry_id": industry.id,
                "industry_name": industry.name_en,
            });
            session.delivery.industry = Some(industry);
            ActionOutcome::new(names::SELECT_INDUSTRY, payload)
        }
        None => ActionOutcome::error(
            names::SELECT_INDUSTRY,
            "no matching industry in the fetched list",
        ),
    }
}

fn select_address(
    request: &ActionRequest,
    user_input: &str,
    session: &mut Session,
) -> ActionOutcome {
    let cached = session.delivery.cached_addresses.clone();
    let selection = request.str_arg("selection").unwrap_or_default();

    let chosen = resolve_address(&cached, selection)
        // Last resort: a bare list number somewhere in the buyer's message.
        .or_else(|| {
            user_input
                .split_whitespace()
                .find_map(|word| resolve_by_number(&cached, word))
        });

    match chosen {
        Some(address) => {
            debug!(address = %address.address_line, "address selected");
            let payload = serde_json::json!({
                "status": "success",
                "address_id": address.id,
                "address_line": address.address_line,
            });
            session.delivery.address = Some(address);
            ActionOutcome::new(names::SELECT_ADDRESS, payload)
        }
        None => ActionOutcome::error(
            names::SELECT_ADDRESS,
            "no valid address selected; please choose from the listed addresses",
        ),
    }
}

/// Resolves a selection by list number, id, or address-line fragment.
fn resolve_address(cached: &[AddressRecord], selection: &str) -> Option<AddressRecord> {
    let selection = selection.trim();
    if selection.is_empty() {
        return None;
    }

    if let Some(address) = resolve_by_number(cached, selection) {
        return Some(address);
    }
    if let Some(address) = cached.iter().find(|a| a.id == selection) {
        return Some(address.clone());
    }

    let wanted = selection.to_lowercase();
    cached
        .iter()
        .find(|a| a.address_line.to_lowercase().contains(&wanted))
        .cloned()
}

fn resolve_by_number(cached: &[AddressRecord], word: &str) -> Option<AddressRecord> {
    let number: usize = word.parse().ok()?;
    number
        .checked_sub(1)
        .and_then(|index| cached.get(index))
        .cloned()
}
