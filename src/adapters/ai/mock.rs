//! Mock reasoning provider for testing.
//!
//! Returns a scripted queue of completions, allowing tests to run the full
//! stage flow without calling a real completion API.
//!
//! # Example
//!
//! ```ignore
//! let reasoning = MockReasoning::new()
//!     .with_reply("Welcome! What do you need?")
//!     .with_completion(Completion::with_actions("", [search_request]));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{Completion, CompletionRequest, ReasoningError, ReasoningService};

/// Scripted mock implementation of [`ReasoningService`].
///
/// Completions queued with `with_reply`/`with_completion` are consumed in
/// order; once the queue is empty the default reply is returned. Every
/// request is recorded for verification.
#[derive(Debug, Clone)]
pub struct MockReasoning {
    script: Arc<Mutex<VecDeque<Completion>>>,
    default_reply: String,
    fail: bool,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockReasoning {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: "OK.".to_string(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock whose every call fails with an unavailable error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Queues a plain text completion.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_completion(Completion::reply(text))
    }

    /// Queues an arbitrary completion.
    pub fn with_completion(self, completion: Completion) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(completion);
        self
    }

    /// Sets the reply returned once the script runs out.
    pub fn with_default_reply(mut self, text: impl Into<String>) -> Self {
        self.default_reply = text.into();
        self
    }

    /// Returns how many completions were requested.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call lock poisoned").len()
    }

    /// Returns a copy of every recorded request.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .clone()
    }
}

impl Default for MockReasoning {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningService for MockReasoning {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ReasoningError> {
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .push(request);

        if self.fail {
            return Err(ReasoningError::unavailable("mock provider down"));
        }

        let scripted = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front();

        Ok(scripted.unwrap_or_else(|| Completion::reply(self.default_reply.clone())))
    }
}
