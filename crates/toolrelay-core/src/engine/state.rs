//! Turn state machine

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Where the engine is within a turn
///
/// `AwaitingUserInput -> ModelCall -> (ToolDispatch -> ModelCall)* -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    AwaitingUserInput,
    ModelCall,
    ToolDispatch,
    Done,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::AwaitingUserInput => "awaiting_user_input",
            EngineState::ModelCall => "model_call",
            EngineState::ToolDispatch => "tool_dispatch",
            EngineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tunables of the conversation loop
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Sent ahead of history on every model call, never stored in it
    pub system_prompt: Option<String>,
    /// Pause between successive dispatches of one reply
    pub tool_call_pause: Duration,
    /// Model calls allowed per turn; 0 means unbounded
    pub max_iterations: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            system_prompt: None,
            tool_call_pause: Duration::from_millis(500),
            max_iterations: 20,
        }
    }
}

impl EngineSettings {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tool_call_pause(mut self, pause: Duration) -> Self {
        self.tool_call_pause = pause;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
