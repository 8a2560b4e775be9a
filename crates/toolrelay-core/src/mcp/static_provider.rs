//! In-process tool provider
//!
//! Serves a fixed tool list from a handler closure. Used for tests and for
//! wiring local tools into the registry without spawning a server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::types::{Tool, ToolOutput};
use super::client::{McpError, McpResult};
use super::provider::ToolProvider;

type Handler = Arc<dyn Fn(&str, &Value) -> McpResult<ToolOutput> + Send + Sync>;

pub struct StaticToolProvider {
    tools: Vec<Tool>,
    handler: Handler,
    calls: Mutex<Vec<(String, Value)>>,
    listing_fails: AtomicBool,
    closed: AtomicBool,
}

impl StaticToolProvider {
    pub fn new<F>(tools: Vec<Tool>, handler: F) -> Self
    where
        F: Fn(&str, &Value) -> McpResult<ToolOutput> + Send + Sync + 'static,
    {
        Self {
            tools,
            handler: Arc::new(handler),
            calls: Mutex::new(Vec::new()),
            listing_fails: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Every call answers with `text`
    pub fn constant(tools: Vec<Tool>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(tools, move |_, _| Ok(ToolOutput::text(text.clone())))
    }

    /// Make `list_tools` fail until switched back
    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    /// Calls received so far, as (local name, arguments)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for StaticToolProvider {
    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        if self.is_closed() {
            return Err(McpError::Closed);
        }
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(McpError::Protocol("tool listing unavailable".to_string()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, local_name: &str, arguments: Value) -> McpResult<ToolOutput> {
        if self.is_closed() {
            return Err(McpError::Closed);
        }
        if !self.tools.iter().any(|t| t.name == local_name) {
            return Err(McpError::ToolCallFailed(format!("unknown tool: {local_name}")));
        }

        self.calls.lock().push((local_name.to_string(), arguments.clone()));
        (self.handler)(local_name, &arguments)
    }

    async fn close(&self) -> McpResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
