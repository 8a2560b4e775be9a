//! Conversions between toolrelay types and genai types
//!
//! Auth never falls back to genai's own env var lookup: the key is resolved
//! by the config layer and handed in explicitly, so a missing key surfaces
//! at startup instead of on the first request.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse, ContentPart, MessageContent,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::types::{ChatMessage, MessageRole, ModelResponse, Tool, ToolCall};

use super::error::{message_indicates_rate_limit, ProviderError};
use super::traits::ProviderModelConfig;

// ============================================================================
// Messages: toolrelay -> genai
// ============================================================================

/// Convert one history entry
///
/// An assistant entry with tool calls keeps its text as a leading text part,
/// followed by one part per call.
pub fn to_genai_message(msg: &ChatMessage) -> GenaiMessage {
    match msg.role {
        MessageRole::System => GenaiMessage::system(msg.content.as_str()),
        MessageRole::User => GenaiMessage::user(msg.content.as_str()),
        MessageRole::Assistant if msg.has_tool_calls() => {
            let calls: Vec<GenaiToolCall> = msg.tool_calls.iter().map(to_genai_tool_call).collect();
            if msg.content.is_empty() {
                return GenaiMessage::from(calls);
            }
            let mut parts = vec![ContentPart::Text(msg.content.clone())];
            parts.extend(calls.into_iter().map(ContentPart::ToolCall));
            GenaiMessage::assistant(MessageContent::from_parts(parts))
        }
        MessageRole::Assistant => GenaiMessage::assistant(msg.content.as_str()),
        MessageRole::Tool => {
            let call_id = msg.tool_call_id.clone().unwrap_or_default();
            GenaiMessage::from(GenaiToolResponse::new(call_id, msg.content.clone()))
        }
    }
}

pub fn to_genai_messages(messages: &[ChatMessage]) -> Vec<GenaiMessage> {
    messages.iter().map(to_genai_message).collect()
}

pub fn to_genai_tool_call(call: &ToolCall) -> GenaiToolCall {
    GenaiToolCall {
        call_id: call.id.clone(),
        fn_name: call.name.clone(),
        fn_arguments: call.input.clone(),
        thought_signatures: None,
    }
}

// ============================================================================
// Tools: toolrelay -> genai
// ============================================================================

pub fn to_genai_tool(tool: &Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(tool.name.as_str()).with_description(tool.description.as_str());

    if let Some(schema) = &tool.input_schema {
        genai_tool = genai_tool.with_schema(schema.clone());
    }

    genai_tool
}

pub fn to_genai_tools(tools: &[Tool]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options and responses
// ============================================================================

pub fn to_genai_options(config: &ProviderModelConfig) -> GenaiOptions {
    let mut options = GenaiOptions::default();

    if let Some(temperature) = config.temperature {
        options = options.with_temperature(f64::from(temperature));
    }

    if let Some(max_tokens) = config.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }

    options
}

pub fn from_genai_tool_call(call: GenaiToolCall) -> ToolCall {
    ToolCall {
        id: call.call_id,
        name: call.fn_name,
        input: call.fn_arguments,
    }
}

/// Convert a completed chat response
pub fn from_genai_response(response: ChatResponse) -> ModelResponse {
    let text = response.first_text().unwrap_or_default().to_string();
    let tool_calls = response
        .into_tool_calls()
        .into_iter()
        .map(from_genai_tool_call)
        .collect();

    ModelResponse { text, tool_calls }
}

/// Classify a genai failure
///
/// HTTP failures carry their status, which decides rate limiting. Only
/// failures without one fall back to matching the rendered message.
pub fn from_genai_error(provider: &str, error: genai::Error) -> ProviderError {
    let status = match &error {
        genai::Error::HttpError { status, .. } => Some(status.as_u16()),
        genai::Error::WebModelCall { webc_error, .. } | genai::Error::WebAdapterCall { webc_error, .. } => {
            match webc_error {
                genai::webc::Error::ResponseFailedStatus { status, .. } => Some(status.as_u16()),
                _ => None,
            }
        }
        _ => None,
    };

    let message = error.to_string();
    match status {
        Some(429) => ProviderError::rate_limited(provider, message),
        Some(status) => ProviderError::api_error(provider, status, message),
        None if message_indicates_rate_limit(&message) => ProviderError::rate_limited(provider, message),
        None => ProviderError::api_error(provider, 500, message),
    }
}

// ============================================================================
// Client creation
// ============================================================================

/// Well-known OpenAI-compatible endpoints genai has no native adapter for
fn compat_endpoint(provider: &str) -> Option<&'static str> {
    match provider {
        "openrouter" => Some("https://openrouter.ai/api/v1/"),
        "mistral" => Some("https://api.mistral.ai/v1/"),
        _ => None,
    }
}

/// Ensure the base URL ends with a slash so genai appends paths correctly
fn normalize_api_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Create a genai client for one configured model
///
/// An explicit `api_base` routes the request through the OpenAI adapter,
/// which covers DeepSeek, local gateways and other compatible servers.
pub fn create_client(provider: &str, config: &ProviderModelConfig) -> Client {
    let api_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let api_key = api_key.clone();
            Box::pin(async move { Ok(api_key.map(AuthData::from_single)) })
        },
    );

    let endpoint_override = config
        .api_base
        .as_deref()
        .map(normalize_api_base)
        .or_else(|| compat_endpoint(provider).map(str::to_string));

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let Some(base) = endpoint_override.clone() else {
                return Ok(target);
            };

            let ServiceTarget { model, auth, .. } = target;
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base),
                auth,
                model: ModelIden::new(AdapterKind::OpenAI, model.model_name),
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
