//! Chat-completion model providers
//!
//! All remote models go through the `genai` crate, which handles the
//! provider-specific protocols. OpenAI-compatible servers (DeepSeek, local
//! gateways) are reached through an explicit `api_base`.
//!
//! The `ScriptedProvider` is kept for tests and for the `--mock` flag.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod retry;

pub use traits::{Provider, ProviderModelConfig};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;

pub use mock::{FallbackMode, RecordedRequest, ScriptedProvider};

pub use retry::{FixedJitter, Jitter, RandomJitter, RetryPolicy, RetryingInvoker, Sleeper, TokioSleeper};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` yields the echoing `ScriptedProvider`; every other id is served
/// by `GenaiProvider`.
pub fn create_provider(
    provider_id: &str,
    model_config: ProviderModelConfig,
    logger: Arc<dyn Logger>,
) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(ScriptedProvider::echo()),
        id => Arc::new(GenaiProvider::new(id, model_config, logger)),
    }
}

/// Providers that work without an API key
pub fn is_keyless(provider_id: &str) -> bool {
    matches!(provider_id.to_lowercase().as_str(), "ollama" | "mock")
}

/// Conventional environment variable holding the provider's API key
pub fn api_key_env_var(provider_id: &str) -> String {
    match provider_id.to_lowercase().as_str() {
        "gemini" | "google" => "GEMINI_API_KEY".to_string(),
        "azure" => "AZURE_OPENAI_API_KEY".to_string(),
        other => format!("{}_API_KEY", other.to_uppercase()),
    }
}
