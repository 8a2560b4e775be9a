//! Tool registry over every connected provider
//!
//! Providers are kept in insertion order, which is the order their tools
//! appear in the catalogue. Tool lists are fetched fresh on every query;
//! nothing is cached across turns.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::Logger;
use crate::mcp::{argument_object, McpResult, ToolProvider};
use crate::types::{Tool, ToolCall, ToolResult};

use super::catalogue::{ProviderTools, ToolCatalogue, ToolDescriptor};
use super::error::ToolDispatchError;
use super::naming::split_qualified_name;

type ProviderEntry = (String, Arc<dyn ToolProvider>);

/// Aggregates tools from all connected providers
pub struct ToolRegistry {
    providers: RwLock<Vec<ProviderEntry>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Register a provider; an existing provider with the same id is replaced in place
    pub fn add_provider(&self, provider_id: impl Into<String>, provider: Arc<dyn ToolProvider>) {
        let provider_id = provider_id.into();
        let mut providers = self.providers.write();

        if let Some(entry) = providers.iter_mut().find(|(id, _)| *id == provider_id) {
            crate::log_warn!(self.logger, "[ToolRegistry] Replacing provider '{}'", provider_id);
            entry.1 = provider;
        } else {
            providers.push((provider_id, provider));
        }
    }

    /// Unregister a provider, returning it so the caller can close it
    pub fn remove_provider(&self, provider_id: &str) -> Option<Arc<dyn ToolProvider>> {
        let mut providers = self.providers.write();
        let index = providers.iter().position(|(id, _)| id == provider_id)?;
        Some(providers.remove(index).1)
    }

    pub fn provider(&self, provider_id: &str) -> Option<Arc<dyn ToolProvider>> {
        self.providers
            .read()
            .iter()
            .find(|(id, _)| id == provider_id)
            .map(|(_, p)| Arc::clone(p))
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.read().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Close and drop every provider
    pub async fn shutdown(&self) {
        let providers: Vec<ProviderEntry> = std::mem::take(&mut *self.providers.write());

        for (id, provider) in providers {
            match provider.close().await {
                Ok(()) => crate::log_debug!(self.logger, "[ToolRegistry] Closed '{}'", id),
                Err(e) => crate::log_warn!(self.logger, "[ToolRegistry] Closing '{}' failed: {}", id, e),
            }
        }
    }

    fn snapshot(&self) -> Vec<ProviderEntry> {
        self.providers.read().clone()
    }

    /// Query every provider, in order, keeping failures
    async fn query_all(&self) -> Vec<(String, McpResult<Vec<Tool>>)> {
        let mut results = Vec::new();
        for (id, provider) in self.snapshot() {
            let listed = provider.list_tools().await;
            if let Err(e) = &listed {
                crate::log_warn!(
                    self.logger,
                    "[ToolRegistry] Listing tools of '{}' failed, skipping it this turn: {}",
                    id,
                    e
                );
            }
            results.push((id, listed));
        }
        results
    }

    /// Descriptors of every tool currently offered
    ///
    /// A provider whose listing fails contributes nothing.
    pub async fn list_all_tools(&self) -> Vec<ToolDescriptor> {
        let descriptors: Vec<ToolDescriptor> = self
            .query_all()
            .await
            .into_iter()
            .filter_map(|(id, listed)| listed.ok().map(|tools| (id, tools)))
            .flat_map(|(id, tools)| {
                tools
                    .into_iter()
                    .map(move |tool| ToolDescriptor::new(id.clone(), tool))
            })
            .collect();

        crate::log_debug!(self.logger, "[ToolRegistry] {} tools available", descriptors.len());
        descriptors
    }

    pub async fn catalogue(&self) -> ToolCatalogue {
        ToolCatalogue::from_descriptors(self.list_all_tools().await)
    }

    /// Local tool names per provider; a failing provider is listed with none
    pub async fn list_connected_tools(&self) -> Vec<ProviderTools> {
        self.query_all()
            .await
            .into_iter()
            .map(|(provider_id, listed)| ProviderTools {
                provider_id,
                tool_names: listed
                    .map(|tools| tools.into_iter().map(|t| t.name).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Run one model-requested call
    ///
    /// Never fails: any dispatch error becomes an error result whose content
    /// is the failure text, so the model can react to it.
    pub async fn dispatch(&self, call: &ToolCall, catalogue: &ToolCatalogue) -> ToolResult {
        match self.try_dispatch(call, catalogue).await {
            Ok(result) => result,
            Err(e) => {
                crate::log_warn!(self.logger, "[ToolRegistry] {} ({}): {}", call.name, call.id, e);
                ToolResult::error(&call.id, format!("Error: {e}"))
            }
        }
    }

    /// Route and run one call
    ///
    /// The catalogue route is preferred; a name it does not know is split on
    /// the separator as a fallback. The first text block is the result as is,
    /// including when the tool flagged the call as failed.
    pub async fn try_dispatch(
        &self,
        call: &ToolCall,
        catalogue: &ToolCatalogue,
    ) -> Result<ToolResult, ToolDispatchError> {
        let (provider_id, local_name) = match catalogue.route(&call.name) {
            Some(route) => route,
            None => split_qualified_name(&call.name)?,
        };

        let provider = self
            .provider(provider_id)
            .ok_or_else(|| ToolDispatchError::UnknownProvider(provider_id.to_string()))?;

        argument_object(&call.input).map_err(|e| ToolDispatchError::InvalidArguments {
            name: call.name.clone(),
            message: e.to_string(),
        })?;

        crate::log_info!(
            self.logger,
            "[ToolRegistry] Calling {} on '{}' with {}",
            local_name,
            provider_id,
            call.input
        );

        let output = provider
            .call_tool(local_name, call.input.clone())
            .await
            .map_err(|source| ToolDispatchError::Provider {
                provider_id: provider_id.to_string(),
                source,
            })?;

        match output.first_text() {
            Some(text) if output.is_error => {
                crate::log_warn!(self.logger, "[ToolRegistry] {} reported an error: {}", call.name, text);
                Ok(ToolResult::error(&call.id, text))
            }
            Some(text) => Ok(ToolResult::success(&call.id, text)),
            None if output.is_error => Err(ToolDispatchError::ToolReported(
                call.name.clone(),
                "no details".to_string(),
            )),
            None => Err(ToolDispatchError::EmptyResult(call.name.clone())),
        }
    }
}
