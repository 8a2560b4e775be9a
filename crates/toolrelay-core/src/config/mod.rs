//! Process configuration
//!
//! A YAML file names the chat model, the retry policy and the tool servers
//! to connect at startup. Tool servers may also come from a JSON file in
//! the `{"mcpServers": {...}}` layout.

mod error;
mod file;
mod servers;

pub use error::{ConfigError, ConfigResult};
pub use file::{EngineConfig, ModelSettings, RelayConfig, RetrySettings, ServerSettings};
pub use servers::{load_mcp_servers_file, parse_mcp_servers_json, ServerConfig, ServerTransport};
