use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use toolrelay_core::session::SessionRegistry;
use toolrelay_core::RelayError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ResetRequest {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    tools: Vec<String>,
}

async fn list_servers(State(state): State<AppState>) -> impl IntoResponse {
    let servers: Vec<ServerInfo> = state
        .sessions
        .shared_registry()
        .list_connected_tools()
        .await
        .into_iter()
        .map(|p| ServerInfo {
            name: p.provider_id,
            tools: p.tool_names,
        })
        .collect();

    Json(json!({ "servers": servers }))
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "query must not be empty", "session_id": request.session_id })),
        );
    }

    let (session_id, engine) = state.sessions.get_or_create(request.session_id.as_deref());
    let mut engine = engine.lock().await;

    match engine.submit_query(&request.query).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({ "response": response, "session_id": session_id })),
        ),
        Err(e) => {
            tracing::warn!(session_id = %session_id, "turn failed: {}", e);
            (
                StatusCode::OK,
                Json(json!({ "error": RelayError::from(e).user_message(), "session_id": session_id })),
            )
        }
    }
}

async fn reset(State(state): State<AppState>, Json(request): Json<ResetRequest>) -> impl IntoResponse {
    match state.sessions.get(&request.session_id) {
        Some(engine) => {
            engine.lock().await.reset();
            (StatusCode::OK, Json(json!({ "status": "conversation cleared" })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown session: {}", request.session_id) })),
        ),
    }
}

pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/servers", get(list_servers))
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    use toolrelay_core::engine::EngineSettings;
    use toolrelay_core::logging::{Logger, NoOpLogger};
    use toolrelay_core::mcp::StaticToolProvider;
    use toolrelay_core::providers::{ProviderError, RetryPolicy, RetryingInvoker, ScriptedProvider};
    use toolrelay_core::{Tool, ToolRegistry};

    fn app_with(model: Arc<ScriptedProvider>) -> Router {
        routes(AppState {
            sessions: sessions_with(model),
        })
    }

    fn sessions_with(model: Arc<ScriptedProvider>) -> Arc<SessionRegistry> {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        let registry = Arc::new(ToolRegistry::new(Arc::clone(&logger)));
        registry.add_provider(
            "market",
            Arc::new(StaticToolProvider::constant(
                vec![Tool::new("query_crypto_price", "price")],
                "BTCUSDT: 65000",
            )),
        );

        let no_retries = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        let invoker = Arc::new(RetryingInvoker::new(model, no_retries, Arc::clone(&logger)));
        Arc::new(SessionRegistry::new(registry, invoker, EngineSettings::default(), logger))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_servers() {
        let app = app_with(Arc::new(ScriptedProvider::echo()));
        let request = Request::builder().uri("/servers").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"servers": [{"name": "market", "tools": ["query_crypto_price"]}]})
        );
    }

    #[tokio::test]
    async fn test_chat_keeps_session_history() {
        let app = app_with(Arc::new(ScriptedProvider::echo()));

        let response = app.clone().oneshot(post_json("/chat", json!({"query": "hello"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Echo: hello");
        let session_id = body["session_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json("/chat", json!({"query": "again", "session_id": session_id})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["session_id"], session_id.as_str());
        assert_eq!(body["response"], "Echo: again");

        let response = app
            .clone()
            .oneshot(post_json("/reset", json!({"session_id": session_id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(post_json("/reset", json!({"session_id": "nope"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_errors() {
        let model = Arc::new(ScriptedProvider::new());
        model.push_error(ProviderError::rate_limited("mock", "429"));
        let app = app_with(model);

        let response = app.clone().oneshot(post_json("/chat", json!({"query": "  "}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(post_json("/chat", json!({"query": "price?"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("busy"));
        assert!(body.get("response").is_none());
    }

    #[tokio::test]
    async fn test_empty_query_creates_no_session() {
        let sessions = sessions_with(Arc::new(ScriptedProvider::echo()));
        let app = routes(AppState {
            sessions: Arc::clone(&sessions),
        });

        for _ in 0..3 {
            let response = app.clone().oneshot(post_json("/chat", json!({"query": ""}))).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["session_id"], Value::Null);
        }
        assert!(sessions.is_empty());

        let response = app.oneshot(post_json("/chat", json!({"query": "hi"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sessions.len(), 1);
    }
}
