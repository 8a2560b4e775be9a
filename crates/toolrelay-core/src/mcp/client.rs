//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers spawned as child processes (stdio) or reachable
//! over streamable HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool as McpTool,
    },
    service::{Peer, RunningService},
    transport::{StreamableHttpClientTransport, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::logging::Logger;
use crate::types::{Tool, ToolOutput};
use super::provider::{argument_object, ToolProvider};

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Connection closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolrelay".to_string(),
            title: Some("ToolRelay".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Live connection to one MCP server
pub struct McpClient {
    provider_id: String,
    peer: Peer<RoleClient>,
    /// Taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Spawn `command` and speak MCP over its stdin/stdout
    pub async fn connect_stdio(
        provider_id: impl Into<String>,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let provider_id = provider_id.into();
        crate::log_info!(
            logger,
            "[McpClient] {}: spawning {} {}",
            provider_id,
            command,
            args.join(" ")
        );

        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args).envs(env);

        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| McpError::ConnectionFailed(format!("{command}: {e}")))?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(provider_id, service, logger))
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        provider_id: impl Into<String>,
        url: &str,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let provider_id = provider_id.into();
        crate::log_info!(logger, "[McpClient] {}: connecting to {}", provider_id, url);

        let transport = StreamableHttpClientTransport::from_uri(url);

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(provider_id, service, logger))
    }

    fn from_service(
        provider_id: String,
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        if let Some(info) = service.peer_info() {
            crate::log_info!(
                logger,
                "[McpClient] {}: initialized ({} {})",
                provider_id,
                info.server_info.name,
                info.server_info.version
            );
        }

        Self {
            provider_id,
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            logger,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn ensure_open(&self) -> McpResult<()> {
        if self.service.lock().await.is_none() {
            return Err(McpError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        self.ensure_open().await?;

        let result = self
            .peer
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        crate::log_debug!(
            self.logger,
            "[McpClient] {}: listed {} tools",
            self.provider_id,
            result.tools.len()
        );

        Ok(result.tools.into_iter().map(from_mcp_tool).collect())
    }

    async fn call_tool(&self, local_name: &str, arguments: Value) -> McpResult<ToolOutput> {
        let arguments = argument_object(&arguments)?;
        self.ensure_open().await?;

        crate::log_info!(self.logger, "[McpClient] {}: calling {}", self.provider_id, local_name);

        let params = CallToolRequestParams {
            meta: None,
            name: local_name.to_owned().into(),
            arguments,
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        Ok(from_call_result(result))
    }

    async fn close(&self) -> McpResult<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        crate::log_info!(self.logger, "[McpClient] {}: closing connection", self.provider_id);
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

/// Convert an advertised rmcp tool, keeping its local name
pub fn from_mcp_tool(tool: McpTool) -> Tool {
    Tool {
        name: tool.name.to_string(),
        description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
        // input_schema is Arc<JsonObject>, convert to Value
        input_schema: serde_json::to_value(tool.input_schema.as_ref()).ok(),
    }
}

/// Keep the text blocks of a call result, in order
pub fn from_call_result(result: CallToolResult) -> ToolOutput {
    let texts = result
        .content
        .into_iter()
        .filter_map(|c| match c.raw {
            RawContent::Text(t) => Some(t.text),
            _ => None,
        })
        .collect();

    ToolOutput {
        texts,
        is_error: result.is_error.unwrap_or(false),
    }
}
