//! YAML configuration file
//!
//! Default location is `<config dir>/toolrelay/config.yaml`
//! (`~/.config/toolrelay/config.yaml` on Linux).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::EngineSettings;
use crate::providers::{api_key_env_var, is_keyless, ProviderModelConfig, RetryPolicy};
use crate::session::SessionLimits;
use crate::tools::SEPARATOR;

use super::error::{ConfigError, ConfigResult};
use super::servers::{load_mcp_servers_file, ordered_servers, ServerConfig};

/// Chat model settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model id as the provider's API expects it
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of the environment variable holding the key
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// OpenAI-compatible base URL
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            api_key: None,
            api_key_env: None,
            api_base: None,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
        }
    }
}

/// Rate-limit retry settings, delays in seconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub retry_delay: f64,
    pub max_delay: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: 1.0,
            max_delay: 60.0,
        }
    }
}

/// Conversation loop settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between successive tool dispatches of one reply
    pub tool_call_pause_ms: u64,
    /// Model calls allowed per turn; 0 means unbounded
    pub max_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_call_pause_ms: 500,
            max_iterations: 20,
        }
    }
}

/// HTTP front end settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Seconds a session may sit unused before it is dropped; 0 keeps it forever
    pub session_idle_secs: u64,
    /// 0 means no cap
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            session_idle_secs: limits.idle_ttl.as_secs(),
            max_sessions: limits.max_sessions,
        }
    }
}

/// Complete process configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub server: ServerSettings,
    /// Tool servers in registry order
    #[serde(default, deserialize_with = "ordered_servers")]
    pub servers: Vec<ServerConfig>,
    /// Extra servers in `{"mcpServers": {...}}` JSON form, appended after `servers`
    #[serde(default)]
    pub servers_file: Option<PathBuf>,
}

impl RelayConfig {
    /// `<config dir>/toolrelay/config.yaml`
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("toolrelay").join("config.yaml")
    }

    /// Parse YAML without touching the filesystem or validating
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read, merge the servers file, and validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and merge the servers file, leaving validation to the caller
    ///
    /// A relative `servers_file` is resolved against the config file's directory.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml_str(&content)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.merge_servers_file(base_dir)?;
        Ok(config)
    }

    /// Append the entries of `servers_file`, if any
    pub fn merge_servers_file(&mut self, base_dir: &Path) -> ConfigResult<()> {
        let Some(file) = self.servers_file.as_ref() else {
            return Ok(());
        };

        let path = if file.is_absolute() {
            file.clone()
        } else {
            base_dir.join(file)
        };

        let imported = load_mcp_servers_file(&path)?;
        self.servers.extend(imported);
        Ok(())
    }

    /// Structural checks that do not depend on the environment
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::invalid("model.model is required"));
        }
        if self.model.provider.trim().is_empty() {
            return Err(ConfigError::invalid("model.provider must not be empty"));
        }

        if self.servers.is_empty() {
            return Err(ConfigError::invalid(
                "no tool servers configured; add entries under `servers` or set `servers_file`",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.name.is_empty() {
                return Err(ConfigError::invalid("server id must not be empty"));
            }
            if server.name.contains(SEPARATOR) {
                return Err(ConfigError::invalid(format!(
                    "server id '{}' must not contain '{}'",
                    server.name, SEPARATOR
                )));
            }
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::DuplicateServer(server.name.clone()));
            }
            server.transport()?;
        }

        let retry = &self.retry;
        let retry_delay = seconds("retry.retry_delay", retry.retry_delay)?;
        let max_delay = seconds("retry.max_delay", retry.max_delay)?;
        if max_delay < retry_delay {
            return Err(ConfigError::invalid("retry.max_delay must not be less than retry.retry_delay"));
        }

        Ok(())
    }

    /// Resolve the API key from the process environment
    pub fn resolve_api_key(&self) -> ConfigResult<Option<String>> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Explicit key, then `api_key_env`, then the provider's conventional variable
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> ConfigResult<Option<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = &self.model;
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(model.api_key.clone()) {
            return Ok(Some(key));
        }
        if let Some(key) = model.api_key_env.as_deref().and_then(|name| non_empty(lookup(name))) {
            return Ok(Some(key));
        }

        let conventional = api_key_env_var(&model.provider);
        if let Some(key) = non_empty(lookup(&conventional)) {
            return Ok(Some(key));
        }

        if is_keyless(&model.provider) {
            return Ok(None);
        }

        Err(ConfigError::MissingApiKey {
            provider: model.provider.clone(),
            env_var: model.api_key_env.clone().unwrap_or(conventional),
        })
    }

    /// Provider settings with the API key resolved
    pub fn model_config(&self) -> ConfigResult<ProviderModelConfig> {
        let api_key = self.resolve_api_key()?;
        Ok(self.model_config_with_key(api_key))
    }

    pub fn model_config_with_key(&self, api_key: Option<String>) -> ProviderModelConfig {
        ProviderModelConfig {
            model: self.model.model.clone(),
            api_key,
            api_base: self.model.api_base.clone(),
            temperature: self.model.temperature,
            max_tokens: self.model.max_tokens,
        }
    }

    pub fn retry_policy(&self) -> ConfigResult<RetryPolicy> {
        Ok(RetryPolicy::new(
            self.retry.max_retries,
            seconds("retry.retry_delay", self.retry.retry_delay)?,
            seconds("retry.max_delay", self.retry.max_delay)?,
        ))
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            idle_ttl: Duration::from_secs(self.server.session_idle_secs),
            max_sessions: self.server.max_sessions,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            system_prompt: self.model.system_prompt.clone(),
            tool_call_pause: Duration::from_millis(self.engine.tool_call_pause_ms),
            max_iterations: self.engine.max_iterations,
        }
    }
}

/// A delay in seconds as a `Duration`, rejecting values it cannot hold
fn seconds(field: &str, value: f64) -> ConfigResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::invalid(format!(
            "{field} must be a non-negative number of seconds within range, got {value}"
        ))
    })
}
