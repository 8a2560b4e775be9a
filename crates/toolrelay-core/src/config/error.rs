//! Configuration errors

use std::path::PathBuf;

/// Errors raised while loading or validating configuration
///
/// All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse servers file {path}: {message}")]
    ServersFile { path: PathBuf, message: String },

    #[error("Tool server '{0}' is configured more than once")]
    DuplicateServer(String),

    #[error("No API key for provider '{provider}': set model.api_key or the {env_var} environment variable")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
