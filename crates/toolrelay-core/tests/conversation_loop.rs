use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use toolrelay_core::engine::{ConversationEngine, EngineError, EngineSettings};
use toolrelay_core::logging::{Logger, NoOpLogger};
use toolrelay_core::mcp::StaticToolProvider;
use toolrelay_core::providers::{
    FixedJitter, ProviderError, RetryPolicy, RetryingInvoker, ScriptedProvider, Sleeper,
};
use toolrelay_core::tools::ToolRegistry;
use toolrelay_core::{ChatMessage, MessageRole, RelayError, Tool, ToolCall, ToolOutput};

#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

struct Harness {
    engine: ConversationEngine,
    model: Arc<ScriptedProvider>,
    registry: Arc<ToolRegistry>,
    sleeper: Arc<RecordingSleeper>,
}

fn harness(registry: ToolRegistry, settings: EngineSettings) -> Harness {
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let registry = Arc::new(registry);
    let model = Arc::new(ScriptedProvider::new());
    let sleeper = Arc::new(RecordingSleeper::default());

    let invoker = RetryingInvoker::new(model.clone(), RetryPolicy::default(), Arc::clone(&logger))
        .with_jitter(Arc::new(FixedJitter(0.25)))
        .with_sleeper(sleeper.clone());

    Harness {
        engine: ConversationEngine::new(Arc::clone(&registry), Arc::new(invoker), settings, logger),
        model,
        registry,
        sleeper,
    }
}

fn market_provider() -> Arc<StaticToolProvider> {
    let tools = vec![Tool::new("query_crypto_price", "Latest price of a trading pair").with_schema(json!({
        "type": "object",
        "properties": {"symbol": {"type": "string"}},
        "required": ["symbol"]
    }))];

    Arc::new(StaticToolProvider::new(tools, |_, args| {
        let symbol = args.get("symbol").and_then(|s| s.as_str()).unwrap_or("?");
        Ok(ToolOutput::text(format!("{symbol}: 65000")))
    }))
}

#[tokio::test]
async fn answers_price_question_through_market_tool() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    let market = market_provider();
    registry.add_provider("market", market.clone());

    let mut h = harness(registry, EngineSettings::default());
    h.model.push_tool_calls(vec![ToolCall::new(
        "call_1",
        "market_query_crypto_price",
        json!({"symbol": "BTCUSDT"}),
    )]);
    h.model.push_text("The current price of BTCUSDT is 65000 USDT.");

    let answer = h.engine.submit_query("price of BTCUSDT").await.unwrap();
    assert_eq!(answer, "The current price of BTCUSDT is 65000 USDT.");

    assert_eq!(market.calls(), vec![("query_crypto_price".to_string(), json!({"symbol": "BTCUSDT"}))]);

    let first = &h.model.requests()[0];
    assert_eq!(first.tool_names, vec!["market_query_crypto_price".to_string()]);

    let history = h.engine.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0], ChatMessage::user("price of BTCUSDT"));
    assert!(history[1].has_tool_calls());
    assert_eq!(history[2], ChatMessage::tool("call_1", "BTCUSDT: 65000"));
    assert_eq!(history[3].role, MessageRole::Assistant);
}

#[tokio::test]
async fn tool_results_follow_emission_order() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    let echo_tools = vec![Tool::new("a", "a"), Tool::new("b", "b")];
    let first = Arc::new(StaticToolProvider::new(echo_tools.clone(), |name, args| {
        Ok(ToolOutput::text(format!("first/{name}/{}", args["i"])))
    }));
    let second = Arc::new(StaticToolProvider::new(echo_tools, |name, args| {
        Ok(ToolOutput::text(format!("second/{name}/{}", args["i"])))
    }));
    registry.add_provider("one", first);
    registry.add_provider("two", second);

    let mut h = harness(registry, EngineSettings::default());
    let calls: Vec<ToolCall> = ["two_b", "one_a", "two_a", "one_b", "two_b"]
        .iter()
        .enumerate()
        .map(|(i, name)| ToolCall::new(format!("c{i}"), *name, json!({ "i": i })))
        .collect();
    h.model.push_tool_calls(calls.clone());
    h.model.push_text("done");

    h.engine.submit_query("run them all").await.unwrap();

    let tool_messages: Vec<_> = h
        .engine
        .history()
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .collect();
    let ids: Vec<_> = tool_messages.iter().filter_map(|m| m.tool_call_id.as_deref()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    assert_eq!(tool_messages[0].content, "second/b/0");
    assert_eq!(tool_messages[1].content, "first/a/1");

    // One pause between each pair of dispatches
    assert_eq!(h.sleeper.sleeps.lock().len(), calls.len() - 1);
}

#[tokio::test]
async fn failing_provider_shrinks_catalogue_for_one_turn() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    let market = market_provider();
    let news = Arc::new(StaticToolProvider::constant(vec![Tool::new("latest", "Latest news")], "headline"));
    registry.add_provider("market", market);
    registry.add_provider("news", news.clone());

    let mut h = harness(registry, EngineSettings::default());
    h.model.push_text("first answer");
    h.model.push_text("second answer");

    news.set_listing_fails(true);
    h.engine.submit_query("anything new?").await.unwrap();
    assert_eq!(
        h.model.requests()[0].tool_names,
        vec!["market_query_crypto_price".to_string()]
    );

    news.set_listing_fails(false);
    h.engine.submit_query("and now?").await.unwrap();
    assert_eq!(
        h.model.requests()[1].tool_names,
        vec!["market_query_crypto_price".to_string(), "news_latest".to_string()]
    );
}

#[tokio::test]
async fn dispatch_failures_are_fed_back_to_the_model() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    registry.add_provider("market", market_provider());

    let mut h = harness(registry, EngineSettings::default());
    h.model.push_tool_calls(vec![
        ToolCall::new("c1", "weather_today", json!({})),
        ToolCall::new("c2", "nonsense", json!({})),
        ToolCall::new("c3", "market_query_crypto_price", json!({"symbol": "ETHUSDT"})),
    ]);
    h.model.push_text("Only the price was available.");

    let answer = h.engine.submit_query("weather and price").await.unwrap();
    assert_eq!(answer, "Only the price was available.");

    let sent = h.model.last_request().unwrap().messages;
    assert!(sent[2].content.contains("unknown tool provider 'weather'"));
    assert!(sent[3].content.contains("malformed tool name 'nonsense'"));
    assert_eq!(sent[4].content, "ETHUSDT: 65000");
}

#[tokio::test]
async fn reset_drops_prior_tool_results() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    registry.add_provider("market", market_provider());

    let mut h = harness(registry, EngineSettings::default());
    h.model.push_tool_calls(vec![ToolCall::new(
        "call_1",
        "market_query_crypto_price",
        json!({"symbol": "BTCUSDT"}),
    )]);
    h.model.push_text("65000");
    h.model.push_text("Hello!");

    h.engine.submit_query("price of BTCUSDT").await.unwrap();
    h.engine.reset();
    h.engine.submit_query("hi").await.unwrap();

    let sent = h.model.last_request().unwrap().messages;
    assert_eq!(sent, vec![ChatMessage::user("hi")]);
    assert!(sent.iter().all(|m| !m.content.contains("65000")));
}

#[tokio::test]
async fn exhausted_rate_limit_degrades_without_losing_history() {
    let registry = ToolRegistry::new(Arc::new(NoOpLogger));
    registry.add_provider("market", market_provider());

    let mut h = harness(registry, EngineSettings::default());
    for _ in 0..4 {
        h.model.push_error(ProviderError::Other("Error code: 429 - rate limit exceeded".to_string()));
    }
    h.model.push_text("back again");

    let err = h.engine.submit_query("price?").await.unwrap_err();
    assert!(matches!(err, EngineError::RateLimited(_)));
    assert_eq!(h.model.call_count(), 4);

    let delays = h.sleeper.sleeps.lock().clone();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs_f64(1.25),
            Duration::from_secs_f64(2.25),
            Duration::from_secs_f64(4.25),
        ]
    );

    let message = RelayError::from(err).user_message();
    assert!(message.starts_with("Sorry"));

    assert_eq!(h.engine.submit_query("retry please").await.unwrap(), "back again");
    assert_eq!(h.engine.history()[0], ChatMessage::user("price?"));
    assert_eq!(h.registry.provider_ids(), vec!["market"]);
}
