//! The tool provider seam

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::{Tool, ToolOutput};
use super::client::{McpError, McpResult};

/// A connected source of callable tools
///
/// Tool names are local to the provider; qualification happens in the
/// registry.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Tools currently offered, in the provider's own order
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke one tool by its local name
    async fn call_tool(&self, local_name: &str, arguments: Value) -> McpResult<ToolOutput>;

    /// Tear down the connection; calling it again is a no-op
    async fn close(&self) -> McpResult<()>;
}

/// Tool arguments must be a JSON object; `null` means "no arguments"
pub fn argument_object(arguments: &Value) -> McpResult<Option<Map<String, Value>>> {
    match arguments {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map.clone())),
        other => Err(McpError::InvalidArguments(format!(
            "expected a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
