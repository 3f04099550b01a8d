//! Reasoning Service Port - Interface for the natural-language completion
//! provider consulted by the stage handlers.
//!
//! The core supplies the recent conversation plus a stage instruction and a
//! fixed menu of callable actions; the provider returns reply text and any
//! requested actions. Handlers must tolerate zero, one, or many requested
//! actions per call, and make at most one follow-up call per turn to
//! produce the final reply after applying them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::actions::{ActionDef, ActionRequest};

/// Port for reasoning/completion interactions.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Generates a completion for the given conversation and action menu.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ReasoningError>;
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Stage instructions guiding the provider.
    System,
    /// Buyer input.
    User,
    /// Provider response.
    Assistant,
    /// Outcome of an applied action, fed back for the final reply.
    Action,
}

/// A message in the conversation sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates an action-outcome message.
    pub fn action(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Action, content)
    }
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Conversation messages (instruction + history + current input).
    pub messages: Vec<Message>,
    /// Menu of actions the provider may request. Empty to force a plain reply.
    pub actions: Vec<ActionDef>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            actions: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds several messages to the conversation.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Sets the action menu.
    pub fn with_actions(mut self, actions: Vec<ActionDef>) -> Self {
        self.actions = actions;
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A completion returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Natural-language reply text (may be empty when actions are requested).
    pub reply: String,
    /// Actions the provider asked the handler to apply.
    pub requested: Vec<ActionRequest>,
}

impl Completion {
    /// Creates a plain text completion with no requested actions.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            requested: Vec::new(),
        }
    }

    /// Creates a completion that requests actions.
    pub fn with_actions(
        text: impl Into<String>,
        requested: impl IntoIterator<Item = ActionRequest>,
    ) -> Self {
        Self {
            reply: text.into(),
            requested: requested.into_iter().collect(),
        }
    }

    /// Returns true if the provider requested any actions.
    pub fn has_actions(&self) -> bool {
        !self.requested.is_empty()
    }
}

/// Reasoning provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl ReasoningError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReasoningError::RateLimited { .. }
                | ReasoningError::Unavailable { .. }
                | ReasoningError::Network(_)
                | ReasoningError::Timeout { .. }
        )
    }
}
