//! Startup wiring shared by every front end

use std::sync::Arc;

use crate::config::{ConfigError, RelayConfig};
use crate::engine::{ConversationEngine, EngineSettings};
use crate::error::{RelayError, RelayResult};
use crate::logging::Logger;
use crate::mcp::connect_all;
use crate::providers::{create_provider, Provider, RetryPolicy, RetryingInvoker};
use crate::session::SessionRegistry;
use crate::tools::ToolRegistry;

/// Connected tool servers plus the model invoker
pub struct Relay {
    registry: Arc<ToolRegistry>,
    invoker: Arc<RetryingInvoker>,
    settings: EngineSettings,
    connection_failures: Vec<RelayError>,
    logger: Arc<dyn Logger>,
}

impl Relay {
    /// Resolve the model, connect every tool server, build the invoker
    ///
    /// Fails when the model settings are unusable or when no tool server
    /// could be connected at all.
    pub async fn from_config(config: &RelayConfig, logger: Arc<dyn Logger>) -> RelayResult<Self> {
        let model_config = config.model_config()?;
        let policy = config.retry_policy()?;
        let provider = create_provider(&config.model.provider, model_config, Arc::clone(&logger));

        let outcome = connect_all(&config.servers, Arc::clone(&logger)).await;
        if outcome.registry.is_empty() {
            return Err(ConfigError::invalid(format!(
                "none of the {} configured tool servers could be connected",
                config.servers.len()
            ))
            .into());
        }

        let connection_failures = outcome
            .failures
            .into_iter()
            .map(|(provider_id, source)| RelayError::ProviderConnection { provider_id, source })
            .collect();

        let mut relay = Self::assemble(config, provider, policy, Arc::new(outcome.registry), logger);
        relay.connection_failures = connection_failures;
        Ok(relay)
    }

    /// Assemble from an already built model provider and registry
    pub fn with_provider(
        config: &RelayConfig,
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> RelayResult<Self> {
        let policy = config.retry_policy()?;
        Ok(Self::assemble(config, provider, policy, registry, logger))
    }

    fn assemble(
        config: &RelayConfig,
        provider: Arc<dyn Provider>,
        policy: RetryPolicy,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let invoker = RetryingInvoker::new(provider, policy, Arc::clone(&logger));
        Self {
            registry,
            invoker: Arc::new(invoker),
            settings: config.engine_settings(),
            connection_failures: Vec::new(),
            logger,
        }
    }

    /// A new conversation over the shared connections
    pub fn engine(&self) -> ConversationEngine {
        ConversationEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            self.settings.clone(),
            Arc::clone(&self.logger),
        )
    }

    /// A session registry over the shared connections
    pub fn sessions(&self) -> SessionRegistry {
        SessionRegistry::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            self.settings.clone(),
            Arc::clone(&self.logger),
        )
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Servers that could not be connected at startup
    pub fn connection_failures(&self) -> &[RelayError] {
        &self.connection_failures
    }

    /// Close every tool server connection
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
