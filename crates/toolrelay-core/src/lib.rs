//! ToolRelay Core
//!
//! Lets a chat model call tools served by several independent MCP servers.
//! Tools of every connected server are exposed under qualified names
//! (`<server>_<tool>`); the conversation engine loops model calls and tool
//! dispatches until the model answers, retrying rate-limited model calls
//! with exponential backoff.
//!
//! ```rust,ignore
//! use toolrelay_core::{config::RelayConfig, Relay};
//!
//! let config = RelayConfig::load(&RelayConfig::default_path())?;
//! let relay = Relay::from_config(&config, logger).await?;
//!
//! let mut engine = relay.engine();
//! let answer = engine.submit_query("price of BTCUSDT").await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tools;
pub mod mcp;
pub mod engine;
pub mod session;
pub mod error;
mod relay;

// Re-export commonly used types
pub use types::{ChatMessage, MessageRole, ModelResponse, Tool, ToolCall, ToolOutput, ToolResult};

pub use logging::{init_tracing, Logger, NoOpLogger, TracingLogger};

pub use config::{ConfigError, RelayConfig};

pub use providers::{Provider, ProviderError, RetryPolicy, RetryingInvoker};

pub use tools::{ToolCatalogue, ToolDescriptor, ToolRegistry};

pub use mcp::{McpClient, McpError, ToolProvider};

pub use engine::{ConversationEngine, EngineError, EngineSettings, EngineState};

pub use session::{SessionLimits, SessionRegistry};

pub use error::{RelayError, RelayResult};

pub use relay::Relay;
