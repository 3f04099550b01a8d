//! Stage handlers for the three conversation phases.
//!
//! Each handler consumes the buyer's input plus the current session and
//! returns the reply text and the updated session. Handlers never check
//! their own activation: the router's dispatch already guarantees the
//! session's stage matches the handler it invokes.
//!
//! A turn makes at most two reasoning calls: one with the stage's action
//! menu, and, when actions were requested, one follow-up carrying the
//! action outcomes to produce the final natural-language reply.

mod address_purpose;
mod product_selection;
mod request_details;

pub use address_purpose::AddressPurposeStage;
pub use product_selection::ProductSelectionStage;
pub use request_details::RequestDetailsStage;

use crate::domain::actions::ActionOutcome;
use crate::domain::foundation::ValidationError;
use crate::domain::session::Session;
use crate::ports::{
    Completion, CompletionRequest, Message, ReasoningError, ReasoningService,
};

/// Reply used when neither reasoning round produced any text.
const EMPTY_REPLY_FALLBACK: &str =
    "Could you tell me a bit more about what you need?";

/// Token budgets matching the two reasoning rounds.
const FIRST_ROUND_MAX_TOKENS: u32 = 1000;
const FOLLOW_UP_MAX_TOKENS: u32 = 800;

/// The result of one handled turn.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    /// Reply text for the buyer.
    pub reply: String,
    /// The session after this turn's mutations.
    pub session: Session,
}

/// Errors that abort a turn.
///
/// Only failures that leave the handler unable to produce a meaningful
/// reply surface here; lookup and order failures are reported back to the
/// reasoning service as action outcomes instead. The router converts these
/// into a generic apology and persists nothing.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("reasoning service failed: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("session is missing a confirmed request type")]
    MissingRequestType,

    #[error(transparent)]
    Invariant(#[from] ValidationError),
}

/// Builds the message list for the first reasoning round: the stage
/// instruction, the recent history, and the current input.
pub(crate) fn conversation_messages(
    instruction: String,
    session: &Session,
    input: &str,
    window: usize,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2 * window + 2);
    messages.push(Message::system(instruction));
    for exchange in session.recent_history(window) {
        messages.push(Message::user(&exchange.user));
        messages.push(Message::assistant(&exchange.assistant));
    }
    messages.push(Message::user(input));
    messages
}

/// Runs the single follow-up round: replays the first round plus the
/// action outcomes, with no action menu, to get the final reply.
pub(crate) async fn follow_up(
    reasoning: &dyn ReasoningService,
    mut messages: Vec<Message>,
    first: &Completion,
    outcomes: &[ActionOutcome],
) -> Result<String, StageError> {
    if !first.reply.trim().is_empty() {
        messages.push(Message::assistant(&first.reply));
    }
    for outcome in outcomes {
        messages.push(Message::action(outcome.render()));
    }

    let completion = reasoning
        .complete(
            CompletionRequest::new()
                .with_messages(messages)
                .with_max_tokens(FOLLOW_UP_MAX_TOKENS),
        )
        .await?;

    Ok(ensure_reply(completion.reply, &first.reply))
}

/// Picks the first non-empty reply, falling back to a neutral prompt.
pub(crate) fn ensure_reply(preferred: String, fallback: &str) -> String {
    if !preferred.trim().is_empty() {
        preferred
    } else if !fallback.trim().is_empty() {
        fallback.to_string()
    } else {
        EMPTY_REPLY_FALLBACK.to_string()
    }
}
