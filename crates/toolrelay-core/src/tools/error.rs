//! Tool dispatch errors

use thiserror::Error;

use crate::mcp::McpError;

/// Why one tool call could not produce a result
///
/// Never fatal to a turn: the text of the error becomes the tool's result.
#[derive(Error, Debug)]
pub enum ToolDispatchError {
    #[error("malformed tool name '{0}': expected <provider>_<tool>")]
    MalformedToolName(String),

    #[error("unknown tool provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid arguments for '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    #[error("provider '{provider_id}' failed: {source}")]
    Provider {
        provider_id: String,
        #[source]
        source: McpError,
    },

    #[error("tool '{0}' reported an error: {1}")]
    ToolReported(String, String),

    #[error("tool '{0}' returned no text content")]
    EmptyResult(String),
}
