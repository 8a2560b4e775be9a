//! Startup connection bootstrap

use std::sync::Arc;

use crate::config::{ServerConfig, ServerTransport};
use crate::logging::Logger;
use crate::tools::ToolRegistry;

use super::client::{McpClient, McpError, McpResult};

/// Open the connection described by one server entry
pub async fn connect_server(server: &ServerConfig, logger: Arc<dyn Logger>) -> McpResult<McpClient> {
    let transport = server
        .transport()
        .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

    match transport {
        ServerTransport::Stdio { command, args, env } => {
            McpClient::connect_stdio(server.name.as_str(), command, args, env, logger).await
        }
        ServerTransport::Http { url } => McpClient::connect_http(server.name.as_str(), url, logger).await,
    }
}

/// Result of connecting every configured server
pub struct ConnectOutcome {
    pub registry: ToolRegistry,
    /// Servers left out, with the reason
    pub failures: Vec<(String, McpError)>,
}

/// Connect every configured server in order
///
/// A server that fails to connect is logged and left out for the rest of
/// the run; there is no reconnect. The registry may end up empty.
pub async fn connect_all(servers: &[ServerConfig], logger: Arc<dyn Logger>) -> ConnectOutcome {
    let registry = ToolRegistry::new(Arc::clone(&logger));
    let mut failures = Vec::new();

    for server in servers {
        match connect_server(server, Arc::clone(&logger)).await {
            Ok(client) => {
                crate::log_info!(logger, "[connect_all] Connected to '{}'", server.name);
                registry.add_provider(server.name.clone(), Arc::new(client));
            }
            Err(e) => {
                crate::log_error!(logger, "[connect_all] Skipping '{}': {}", server.name, e);
                failures.push((server.name.clone(), e));
            }
        }
    }

    crate::log_info!(
        logger,
        "[connect_all] {} of {} tool servers connected",
        registry.len(),
        servers.len()
    );
    ConnectOutcome { registry, failures }
}
