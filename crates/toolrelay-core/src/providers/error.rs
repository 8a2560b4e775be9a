//! Provider error types

use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// API request failed
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Rate limited
    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Invalid response from provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limited error
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error signals upstream rate limiting
    ///
    /// The `RateLimited` variant and a 429 status are authoritative. Other
    /// errors are matched on their text as a last resort, since some
    /// gateways only report the status inside the message body.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::ApiError { status: 429, .. } => true,
            ProviderError::MissingApiKey { .. } => false,
            other => message_indicates_rate_limit(&other.to_string()),
        }
    }
}

/// Text fallback for rate-limit detection
pub fn message_indicates_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_variant() {
        assert!(ProviderError::rate_limited("openai", "slow down").is_rate_limited());
    }

    #[test]
    fn test_rate_limit_status() {
        assert!(ProviderError::api_error("openai", 429, "quota").is_rate_limited());
        assert!(!ProviderError::api_error("openai", 401, "bad key").is_rate_limited());
    }

    #[test]
    fn test_rate_limit_message_fallback() {
        let err = ProviderError::Other("HTTP status 429 Too Many Requests".to_string());
        assert!(err.is_rate_limited());

        let err = ProviderError::api_error("deepseek", 500, "upstream said: error code 429");
        assert!(err.is_rate_limited());

        let err = ProviderError::Other("connection reset".to_string());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_missing_key_never_rate_limited() {
        assert!(!ProviderError::missing_api_key("openai").is_rate_limited());
    }
}
