//! The conversation loop

use std::sync::Arc;

use crate::logging::Logger;
use crate::providers::RetryingInvoker;
use crate::tools::{ProviderTools, ToolCatalogue, ToolRegistry};
use crate::types::{ChatMessage, ToolCall};

use super::error::{EngineError, EngineResult};
use super::state::{EngineSettings, EngineState};

/// Drives one conversation: model calls, tool dispatch, history
///
/// Turns are strictly sequential; `submit_query` takes `&mut self`, so a
/// reset can only happen between turns.
pub struct ConversationEngine {
    registry: Arc<ToolRegistry>,
    invoker: Arc<RetryingInvoker>,
    settings: EngineSettings,
    history: Vec<ChatMessage>,
    state: EngineState,
    logger: Arc<dyn Logger>,
}

impl ConversationEngine {
    pub fn new(
        registry: Arc<ToolRegistry>,
        invoker: Arc<RetryingInvoker>,
        settings: EngineSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            invoker,
            settings,
            history: Vec::new(),
            state: EngineState::AwaitingUserInput,
            logger,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Clear history
    pub fn reset(&mut self) {
        crate::log_info!(
            self.logger,
            "[ConversationEngine] Reset, dropping {} messages",
            self.history.len()
        );
        self.history.clear();
        self.state = EngineState::AwaitingUserInput;
    }

    pub async fn list_connected_tools(&self) -> Vec<ProviderTools> {
        self.registry.list_connected_tools().await
    }

    /// Run one turn and return the model's final answer
    pub async fn submit_query(&mut self, query: &str) -> EngineResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let result = self.run_turn(query).await;
        self.state = match result {
            Ok(_) => EngineState::Done,
            Err(_) => EngineState::AwaitingUserInput,
        };
        result
    }

    async fn run_turn(&mut self, query: &str) -> EngineResult<String> {
        self.history.push(ChatMessage::user(query));

        let catalogue = self.registry.catalogue().await;
        let tools = catalogue.model_tools();
        crate::log_info!(
            self.logger,
            "[ConversationEngine] Turn started with {} tools",
            tools.len()
        );

        let limit = self.settings.max_iterations;
        let mut model_calls: u32 = 0;

        loop {
            if limit > 0 && model_calls >= limit {
                crate::log_warn!(
                    self.logger,
                    "[ConversationEngine] No final answer after {} model calls",
                    model_calls
                );
                return Err(EngineError::IterationLimit { limit });
            }

            self.state = EngineState::ModelCall;
            let messages = self.request_messages();
            let response = self.invoker.invoke(&messages, &tools).await.map_err(|e| {
                crate::log_error!(self.logger, "[ConversationEngine] Model call failed: {}", e);
                EngineError::from(e)
            })?;
            model_calls += 1;

            self.history.push(response.to_message());

            if !response.requires_tool_dispatch() {
                return Ok(response.text);
            }

            self.state = EngineState::ToolDispatch;
            self.dispatch_all(&response.tool_calls, &catalogue).await;
        }
    }

    /// Dispatch in emission order, one at a time
    async fn dispatch_all(&mut self, calls: &[ToolCall], catalogue: &ToolCatalogue) {
        let pause = self.settings.tool_call_pause;
        let sleeper = self.invoker.sleeper();

        for (index, call) in calls.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                sleeper.sleep(pause).await;
            }

            let result = self.registry.dispatch(call, catalogue).await;
            crate::log_debug!(
                self.logger,
                "[ConversationEngine] {} -> {} chars{}",
                call.name,
                result.content.len(),
                if result.is_error { " (error)" } else { "" }
            );
            self.history.push(ChatMessage::from(result));
        }
    }

    fn request_messages(&self) -> Vec<ChatMessage> {
        match &self.settings.system_prompt {
            Some(prompt) => std::iter::once(ChatMessage::system(prompt.as_str()))
                .chain(self.history.iter().cloned())
                .collect(),
            None => self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::StaticToolProvider;
    use crate::providers::{FixedJitter, ProviderError, RetryPolicy, ScriptedProvider, Sleeper};
    use crate::types::{MessageRole, Tool};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

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

    struct Fixture {
        engine: ConversationEngine,
        model: Arc<ScriptedProvider>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn fixture(settings: EngineSettings) -> Fixture {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        let registry = Arc::new(ToolRegistry::new(Arc::clone(&logger)));
        registry.add_provider(
            "calc",
            Arc::new(StaticToolProvider::new(vec![Tool::new("double", "Double a number")], |_, args| {
                let n = args.get("n").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok(crate::types::ToolOutput::text((n * 2).to_string()))
            })),
        );

        let model = Arc::new(ScriptedProvider::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = RetryingInvoker::new(model.clone(), RetryPolicy::default(), Arc::clone(&logger))
            .with_jitter(Arc::new(FixedJitter(0.0)))
            .with_sleeper(sleeper.clone());

        Fixture {
            engine: ConversationEngine::new(registry, Arc::new(invoker), settings, logger),
            model,
            sleeper,
        }
    }

    fn double(id: &str, n: i64) -> ToolCall {
        ToolCall::new(id, "calc_double", json!({ "n": n }))
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let mut f = fixture(EngineSettings::default());
        f.model.push_text("hello there");

        assert_eq!(f.engine.submit_query("  hi  ").await.unwrap(), "hello there");
        assert_eq!(f.engine.state(), EngineState::Done);
        assert_eq!(
            f.engine.history(),
            &[ChatMessage::user("hi"), ChatMessage::assistant("hello there")]
        );
    }

    #[tokio::test]
    async fn test_empty_query_leaves_history_alone() {
        let mut f = fixture(EngineSettings::default());
        assert!(matches!(f.engine.submit_query("   ").await, Err(EngineError::EmptyQuery)));
        assert!(f.engine.history().is_empty());
        assert_eq!(f.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_round_trip_and_pause_between_calls() {
        let mut f = fixture(EngineSettings::default().with_tool_call_pause(Duration::from_millis(250)));
        f.model.push_tool_calls(vec![double("a", 2), double("b", 5)]);
        f.model.push_text("4 and 10");

        assert_eq!(f.engine.submit_query("double 2 and 5").await.unwrap(), "4 and 10");

        let history = f.engine.history();
        assert_eq!(history.len(), 5);
        assert_eq!(history[1].tool_calls.len(), 2);
        assert_eq!(history[2], ChatMessage::tool("a", "4"));
        assert_eq!(history[3], ChatMessage::tool("b", "10"));

        assert_eq!(*f.sleeper.sleeps.lock(), vec![Duration::from_millis(250)]);

        let second = &f.model.requests()[1];
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.tool_names, vec!["calc_double".to_string()]);
    }

    #[tokio::test]
    async fn test_system_prompt_is_sent_but_not_stored() {
        let mut f = fixture(EngineSettings::default().with_system_prompt("Be terse"));
        f.model.push_text("ok");

        f.engine.submit_query("hi").await.unwrap();

        let sent = f.model.last_request().unwrap().messages;
        assert_eq!(sent[0].role, MessageRole::System);
        assert_eq!(sent[1], ChatMessage::user("hi"));
        assert!(f.engine.history().iter().all(|m| m.role != MessageRole::System));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let mut f = fixture(EngineSettings::default().with_max_iterations(2));
        f.model.push_tool_calls(vec![double("a", 1)]);
        f.model.push_tool_calls(vec![double("b", 2)]);
        f.model.push_text("never reached");

        let err = f.engine.submit_query("loop").await.unwrap_err();
        assert!(matches!(err, EngineError::IterationLimit { limit: 2 }));
        assert_eq!(f.model.call_count(), 2);
        assert_eq!(f.engine.history().len(), 5);
        assert_eq!(f.engine.state(), EngineState::AwaitingUserInput);
    }

    #[tokio::test]
    async fn test_unbounded_when_limit_is_zero() {
        let mut f = fixture(EngineSettings::default().with_max_iterations(0));
        for i in 0..30 {
            f.model.push_tool_calls(vec![double(&format!("c{i}"), i)]);
        }
        f.model.push_text("finally");

        assert_eq!(f.engine.submit_query("go").await.unwrap(), "finally");
        assert_eq!(f.model.call_count(), 31);
    }

    #[tokio::test]
    async fn test_model_error_keeps_history() {
        let mut f = fixture(EngineSettings::default());
        f.model.push_tool_calls(vec![double("a", 3)]);
        f.model.push_error(ProviderError::api_error("mock", 401, "bad key"));
        f.model.push_text("recovered");

        let err = f.engine.submit_query("first").await.unwrap_err();
        assert!(matches!(err, EngineError::ModelInvocation(_)));
        assert_eq!(f.engine.history().len(), 3);

        assert_eq!(f.engine.submit_query("second").await.unwrap(), "recovered");
        let sent = f.model.last_request().unwrap().messages;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3], ChatMessage::user("second"));
    }

    #[tokio::test]
    async fn test_reset_between_turns() {
        let mut f = fixture(EngineSettings::default());
        f.model.push_tool_calls(vec![double("a", 1)]);
        f.model.push_text("2");
        f.model.push_text("fresh");

        f.engine.submit_query("double 1").await.unwrap();
        f.engine.reset();
        assert!(f.engine.history().is_empty());
        assert_eq!(f.engine.state(), EngineState::AwaitingUserInput);

        f.engine.submit_query("new topic").await.unwrap();
        assert_eq!(
            f.model.last_request().unwrap().messages,
            vec![ChatMessage::user("new topic")]
        );
    }
}
