//! Scripted provider for testing
//!
//! Replays queued replies in order without any network access, and records
//! every request it receives so tests can assert on what the model saw.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::Provider;
use crate::types::{ChatMessage, MessageRole, ModelResponse, Tool, ToolCall};

/// What to do once the script runs out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Fail the call
    Exhausted,
}

/// One request as seen by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Mock chat model driven by a queue of replies
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResult<ModelResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fallback: FallbackMode,
}

impl ScriptedProvider {
    /// Empty script; unscripted calls fail
    pub fn new() -> Self {
        Self::with_fallback(FallbackMode::Exhausted)
    }

    /// Echo provider used by `--mock`
    pub fn echo() -> Self {
        Self::with_fallback(FallbackMode::Echo)
    }

    pub fn with_fallback(fallback: FallbackMode) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fallback,
        }
    }

    pub fn push_response(&self, response: ModelResponse) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push_response(ModelResponse::text(text))
    }

    pub fn push_tool_calls(&self, calls: Vec<ToolCall>) -> &Self {
        self.push_response(ModelResponse::tool_calls(calls))
    }

    pub fn push_error(&self, error: ProviderError) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }

        match self.fallback {
            FallbackMode::Echo => {
                let text = Self::last_user_message(messages).unwrap_or_default();
                Ok(ModelResponse::text(format!("Echo: {text}")))
            }
            FallbackMode::Exhausted => Err(ProviderError::Other(
                "mock provider script exhausted".to_string(),
            )),
        }
    }
}
