//! Scripted provider for deterministic tests
//!
//! Enabled with the `test-util` feature. Responses are replayed in the order
//! they were queued; every request is recorded for later inspection.

use crate::{CompletionRequest, CompletionResponse, LLMError, LLMProvider, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// A queued reply: either a response or an error to return
enum Scripted {
    Reply(CompletionResponse),
    Fail(LLMError),
}

/// Provider that replays queued responses
///
/// When the queue runs dry it answers with a plain end-of-turn text so that
/// tests only need to script the turns they care about.
#[derive(Default)]
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fallback: Option<String>,
}

impl ScriptedProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with the given responses queued
    pub fn with_responses(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        let provider = Self::new();
        for response in responses {
            provider.push(response);
        }
        provider
    }

    /// Text returned once the queue is empty
    #[must_use]
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Queue a response
    pub fn push(&self, response: CompletionResponse) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Scripted::Reply(response));
    }

    /// Queue a plain text answer
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(CompletionResponse::text(text));
    }

    /// Queue an error
    pub fn push_error(&self, error: LLMError) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Scripted::Fail(error));
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(CompletionResponse::text(
                self.fallback.clone().unwrap_or_else(|| "done".to_string()),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &'static str {
        "scripted-model"
    }
}
