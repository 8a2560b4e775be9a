//! Top-level error kinds for front ends

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::mcp::McpError;
use crate::tools::ToolDispatchError;

/// Every failure a front end may have to report
#[derive(Error, Debug)]
pub enum RelayError {
    /// Fatal, startup only
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// That provider is left out for the run
    #[error("tool server '{provider_id}' unavailable: {source}")]
    ProviderConnection {
        provider_id: String,
        #[source]
        source: McpError,
    },

    /// Normally fed back to the model instead of surfacing
    #[error(transparent)]
    ToolDispatch(#[from] ToolDispatchError),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ModelInvocation(String),
}

impl From<EngineError> for RelayError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::RateLimited(e) => RelayError::RateLimited(e.to_string()),
            other => RelayError::ModelInvocation(other.to_string()),
        }
    }
}

impl RelayError {
    /// Text safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            RelayError::RateLimited(_) => {
                "Sorry, the model service is busy right now. Please try again in a moment.".to_string()
            }
            RelayError::ModelInvocation(detail) => {
                format!("Sorry, something went wrong while answering ({detail}). Please try again.")
            }
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::RateLimited(_) | RelayError::ModelInvocation(_))
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn test_engine_error_mapping() {
        let limited = RelayError::from(EngineError::from(ProviderError::rate_limited("openai", "429")));
        assert!(matches!(limited, RelayError::RateLimited(_)));
        assert!(limited.user_message().contains("busy"));
        assert!(limited.is_retryable());

        let failed = RelayError::from(EngineError::from(ProviderError::api_error("openai", 401, "bad key")));
        assert!(matches!(failed, RelayError::ModelInvocation(_)));
        assert!(failed.user_message().starts_with("Sorry"));

        let limit = RelayError::from(EngineError::IterationLimit { limit: 3 });
        assert!(limit.user_message().contains("3 model calls"));
    }

    #[test]
    fn test_configuration_is_not_retryable() {
        let err = RelayError::from(ConfigError::invalid("model.model is required"));
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("model.model"));
    }
}
