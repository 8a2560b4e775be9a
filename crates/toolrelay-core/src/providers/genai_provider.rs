//! GenaiProvider - chat completion through the genai crate

use std::sync::Arc;

use async_trait::async_trait;
use genai::chat::ChatRequest;
use genai::Client;

use crate::logging::Logger;
use crate::types::{ChatMessage, ModelResponse, Tool};

use super::error::ProviderResult;
use super::genai_adapter::{
    create_client, from_genai_error, from_genai_response, to_genai_messages, to_genai_options,
    to_genai_tools,
};
use super::traits::{Provider, ProviderModelConfig};

/// Provider backed by a remote chat-completion API
pub struct GenaiProvider {
    provider_id: String,
    model_config: ProviderModelConfig,
    client: Client,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a provider; the client is built once and reused for every call
    pub fn new(
        provider_id: impl Into<String>,
        model_config: ProviderModelConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let provider_id = provider_id.into();
        let client = create_client(&provider_id, &model_config);
        Self {
            provider_id,
            model_config,
            client,
            logger,
        }
    }

    pub fn model_config(&self) -> &ProviderModelConfig {
        &self.model_config
    }

    /// Extract model name from a model string (e.g., "openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map(|(_, name)| name).unwrap_or(model)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse> {
        let model_name = Self::extract_model_name(&self.model_config.model);

        crate::log_debug!(
            self.logger,
            "[GenaiProvider] complete: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            model_name,
            messages.len(),
            tools.len()
        );

        let mut request = ChatRequest::new(to_genai_messages(messages));
        if !tools.is_empty() {
            request = request.with_tools(to_genai_tools(tools));
        }
        let options = to_genai_options(&self.model_config);

        let response = self
            .client
            .exec_chat(model_name, request, Some(&options))
            .await
            .map_err(|e| from_genai_error(&self.provider_id, e))?;

        let response = from_genai_response(response);

        crate::log_debug!(
            self.logger,
            "[GenaiProvider] reply: {} chars, {} tool call(s)",
            response.text.len(),
            response.tool_calls.len()
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_extract_model_name() {
        assert_eq!(GenaiProvider::extract_model_name("openai/gpt-4o"), "gpt-4o");
        assert_eq!(GenaiProvider::extract_model_name("deepseek-chat"), "deepseek-chat");
        assert_eq!(
            GenaiProvider::extract_model_name("openrouter/meta/llama-3"),
            "meta/llama-3"
        );
    }

    #[test]
    fn test_name_and_config() {
        let config = ProviderModelConfig::new("deepseek-chat")
            .with_api_key("sk-test")
            .with_api_base("https://api.deepseek.com");
        let provider = GenaiProvider::new("deepseek", config.clone(), Arc::new(NoOpLogger));

        assert_eq!(provider.name(), "deepseek");
        assert_eq!(provider.model_config(), &config);
    }
}
