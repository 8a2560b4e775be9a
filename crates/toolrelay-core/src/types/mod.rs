//! Core types for model and tool interactions
//!
//! This module contains the shared types passed between the conversation
//! engine, the model providers and the tool providers.

mod message;
mod tool;
mod response;

pub use message::{ChatMessage, MessageRole};
pub use tool::{Tool, ToolCall, ToolOutput, ToolResult};
pub use response::ModelResponse;
