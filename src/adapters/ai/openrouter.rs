//! OpenRouter Reasoning Adapter - chat-completions implementation of the
//! reasoning port.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint with function
//! calling (OpenRouter by default), translating between the port's message
//! and action types and the wire format.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenRouterConfig::new(api_key)
//!     .with_model("anthropic/claude-3.5-sonnet")
//!     .with_base_url("https://openrouter.ai/api/v1");
//!
//! let reasoning = OpenRouterReasoning::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::domain::actions::ActionRequest;
use crate::ports::{
    Completion, CompletionRequest, MessageRole, ReasoningError, ReasoningService,
};

/// Configuration for the OpenRouter provider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "anthropic/claude-3.5-sonnet").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenRouterConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenRouter chat-completions implementation of [`ReasoningService`].
pub struct OpenRouterReasoning {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterReasoning {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts the port request to the wire format.
    ///
    /// Action-outcome messages carry no tool-call ids in the port contract,
    /// so they travel as system messages with an explicit prefix.
    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::System => WireMessage {
                    role: "system",
                    content: msg.content.clone(),
                },
                MessageRole::User => WireMessage {
                    role: "user",
                    content: msg.content.clone(),
                },
                MessageRole::Assistant => WireMessage {
                    role: "assistant",
                    content: msg.content.clone(),
                },
                MessageRole::Action => WireMessage {
                    role: "system",
                    content: format!("Action result: {}", msg.content),
                },
            })
            .collect();

        let tools: Vec<serde_json::Value> = request
            .actions
            .iter()
            .map(|action| action.to_chat_format())
            .collect();

        WireRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
            tools: if tools.is_empty() { None } else { Some(tools) },
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, ReasoningError> {
        let wire = self.to_wire_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ReasoningError::network(format!("Connection failed: {}", e))
                } else {
                    ReasoningError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, ReasoningError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ReasoningError::AuthenticationFailed),
            429 => Err(ReasoningError::RateLimited {
                retry_after_secs: 30,
            }),
            400 => Err(ReasoningError::InvalidRequest(error_body)),
            500..=599 => Err(ReasoningError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(ReasoningError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<Completion, ReasoningError> {
        let response = self.handle_response_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReasoningError::parse("No choices in response"))?;

        let requested = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(&call.function.arguments);
                ActionRequest::new(call.function.name, arguments)
            })
            .collect();

        Ok(Completion {
            reply: choice.message.content.unwrap_or_default(),
            requested,
        })
    }
}

/// Parses the provider's argument string, degrading to an empty object on
/// malformed JSON rather than failing the whole completion.
fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "malformed tool-call arguments, substituting empty object");
        serde_json::json!({})
    })
}

#[async_trait]
impl ReasoningService for OpenRouterReasoning {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ReasoningError> {
        let mut last_error = ReasoningError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&request).await {
                Ok(response) => match self.parse_response(response).await {
                    Ok(completion) => return Ok(completion),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}
