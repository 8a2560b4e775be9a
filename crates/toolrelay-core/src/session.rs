//! Per-session conversation engines
//!
//! Every session token owns its own `ConversationEngine` (and so its own
//! history). All sessions share one `ToolRegistry` and one model invoker.
//! Sessions idle longer than the TTL are swept whenever a new one is created,
//! and the least recently used idle session makes room once the cap is hit.
//! A session whose engine is still held by a caller is never evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::engine::{ConversationEngine, EngineSettings};
use crate::logging::Logger;
use crate::providers::RetryingInvoker;
use crate::tools::ToolRegistry;

/// A session's engine; locking it serialises that session's turns
pub type SharedEngine = Arc<Mutex<ConversationEngine>>;

/// Bounds on how many sessions are kept and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Idle time after which a session may be dropped; zero keeps sessions forever
    pub idle_ttl: Duration,
    /// Most sessions kept at once; zero means no cap
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
        }
    }
}

struct Session {
    engine: SharedEngine,
    last_used: Instant,
}

impl Session {
    /// Only the registry holds the engine
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.engine) == 1
    }
}

/// Session token -> conversation engine
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    registry: Arc<ToolRegistry>,
    invoker: Arc<RetryingInvoker>,
    settings: EngineSettings,
    limits: SessionLimits,
    logger: Arc<dyn Logger>,
}

impl SessionRegistry {
    pub fn new(
        registry: Arc<ToolRegistry>,
        invoker: Arc<RetryingInvoker>,
        settings: EngineSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            registry,
            invoker,
            settings,
            limits: SessionLimits::default(),
            logger,
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn new_engine(&self) -> SharedEngine {
        Arc::new(Mutex::new(ConversationEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            self.settings.clone(),
            Arc::clone(&self.logger),
        )))
    }

    /// Start a session under a fresh token
    pub fn create(&self) -> (String, SharedEngine) {
        let token = Uuid::new_v4().to_string();
        let engine = self.new_engine();
        let now = Instant::now();

        let mut sessions = self.sessions.write();
        self.evict(&mut sessions, now);
        sessions.insert(
            token.clone(),
            Session {
                engine: Arc::clone(&engine),
                last_used: now,
            },
        );
        drop(sessions);

        crate::log_info!(self.logger, "[SessionRegistry] Created session {}", token);
        (token, engine)
    }

    /// Look up `token`, or create a session when it is absent or unknown
    ///
    /// An unknown token gets a fresh one rather than being adopted.
    pub fn get_or_create(&self, token: Option<&str>) -> (String, SharedEngine) {
        if let Some(token) = token {
            if let Some(engine) = self.get(token) {
                return (token.to_string(), engine);
            }
        }
        self.create()
    }

    /// Look up a session and mark it used
    pub fn get(&self, token: &str) -> Option<SharedEngine> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(token)?;
        session.last_used = Instant::now();
        Some(Arc::clone(&session.engine))
    }

    pub fn remove(&self, token: &str) -> Option<SharedEngine> {
        self.sessions.write().remove(token).map(|s| s.engine)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn shared_registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Drop expired sessions, then make room for one more under the cap
    fn evict(&self, sessions: &mut HashMap<String, Session>, now: Instant) {
        let SessionLimits { idle_ttl, max_sessions } = self.limits;

        if !idle_ttl.is_zero() {
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_idle() || now.duration_since(s.last_used) < idle_ttl);
            let expired = before - sessions.len();
            if expired > 0 {
                crate::log_debug!(self.logger, "[SessionRegistry] Expired {} idle session(s)", expired);
            }
        }

        if max_sessions == 0 {
            return;
        }
        while sessions.len() >= max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, s)| s.is_idle())
                .min_by_key(|(_, s)| s.last_used)
                .map(|(token, _)| token.clone());

            match oldest {
                Some(token) => {
                    sessions.remove(&token);
                    crate::log_debug!(self.logger, "[SessionRegistry] Evicted session {}", token);
                }
                None => {
                    crate::log_warn!(
                        self.logger,
                        "[SessionRegistry] {} sessions busy, exceeding the cap of {}",
                        sessions.len(),
                        max_sessions
                    );
                    break;
                }
            }
        }
    }
}
