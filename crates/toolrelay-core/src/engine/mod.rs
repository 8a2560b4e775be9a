//! Conversation engine
//!
//! Owns the message history of one conversation and drives the loop of
//! model calls and tool dispatches until the model gives a final answer.

mod conversation;
mod error;
mod state;

pub use conversation::ConversationEngine;
pub use error::{EngineError, EngineResult};
pub use state::{EngineSettings, EngineState};
