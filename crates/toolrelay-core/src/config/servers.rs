//! Tool server entries
//!
//! Servers are written as a map keyed by provider id. Document order is kept
//! because it defines the order the registry queries providers in.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use super::error::{ConfigError, ConfigResult};

/// Launch or connection parameters for one tool server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Provider id; becomes the qualified-name prefix of its tools
    pub name: String,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub url: Option<String>,
}

/// How to reach a tool server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTransport<'a> {
    Stdio {
        command: &'a str,
        args: &'a [String],
        env: &'a BTreeMap<String, String>,
    },
    Http {
        url: &'a str,
    },
}

impl ServerConfig {
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: Some(command.into()),
            args,
            env: BTreeMap::new(),
            url: None,
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            url: Some(url.into()),
        }
    }

    /// Exactly one of `command` and `url` must be set
    pub fn transport(&self) -> ConfigResult<ServerTransport<'_>> {
        match (self.command.as_deref(), self.url.as_deref()) {
            (Some(command), None) if !command.trim().is_empty() => Ok(ServerTransport::Stdio {
                command,
                args: &self.args,
                env: &self.env,
            }),
            (None, Some(url)) if !url.trim().is_empty() => Ok(ServerTransport::Http { url }),
            (Some(_), Some(_)) => Err(ConfigError::invalid(format!(
                "server '{}' sets both command and url",
                self.name
            ))),
            _ => Err(ConfigError::invalid(format!(
                "server '{}' needs a command or a url",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default, alias = "serverUrl")]
    url: Option<String>,
}

impl ServerEntry {
    fn named(self, name: String) -> ServerConfig {
        ServerConfig {
            name,
            command: self.command,
            args: self.args,
            env: self.env,
            url: self.url,
        }
    }
}

/// Deserialize a `{id: entry}` map into servers, in document order
pub(crate) fn ordered_servers<'de, D>(deserializer: D) -> Result<Vec<ServerConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedServers;

    impl<'de> Visitor<'de> for OrderedServers {
        type Value = Vec<ServerConfig>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of server id to server settings")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut servers = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, entry)) = map.next_entry::<String, ServerEntry>()? {
                servers.push(entry.named(name));
            }
            Ok(servers)
        }
    }

    deserializer.deserialize_map(OrderedServers)
}

#[derive(Debug, Deserialize)]
struct McpServersFile {
    #[serde(rename = "mcpServers", default, deserialize_with = "ordered_servers")]
    mcp_servers: Vec<ServerConfig>,
}

/// Parse the common `{"mcpServers": {...}}` JSON layout
pub fn parse_mcp_servers_json(json: &str) -> Result<Vec<ServerConfig>, serde_json::Error> {
    serde_json::from_str::<McpServersFile>(json).map(|file| file.mcp_servers)
}

/// Read a servers file from disk
pub fn load_mcp_servers_file(path: &Path) -> ConfigResult<Vec<ServerConfig>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_mcp_servers_json(&content).map_err(|e| ConfigError::ServersFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
