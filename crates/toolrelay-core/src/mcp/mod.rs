//! MCP (Model Context Protocol) tool providers
//!
//! Uses the official rmcp SDK to connect to tool servers, either spawned as
//! child processes (stdio) or reached over streamable HTTP.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay_core::mcp::{McpClient, ToolProvider};
//!
//! let client = McpClient::connect_stdio("market", "python", &args, &env, logger).await?;
//!
//! // Local tool names, as the server reports them
//! let tools = client.list_tools().await?;
//!
//! let output = client.call_tool("query_crypto_price", json!({"symbol": "BTCUSDT"})).await?;
//! client.close().await?;
//! ```

mod client;
mod connect;
mod provider;
mod static_provider;

pub use client::{from_call_result, from_mcp_tool, McpClient, McpError, McpResult};
pub use connect::{connect_all, connect_server, ConnectOutcome};
pub use provider::{argument_object, ToolProvider};
pub use static_provider::StaticToolProvider;
