//! Model completion response

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::tool::ToolCall;

/// One reply of the chat-completion model
///
/// Either a final answer (`tool_calls` empty) or a request to run tools first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Text produced by the model, possibly empty alongside tool calls
    pub text: String,
    /// Tool calls in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    /// A final textual answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A reply asking for the given tool calls
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }

    /// Whether the model needs tool results before it can answer
    pub fn requires_tool_dispatch(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message to append to history, tool calls included
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::assistant_with_tool_calls(self.text.clone(), self.tool_calls.clone())
    }
}
