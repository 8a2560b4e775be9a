//! Rate-limit retry with exponential backoff and additive jitter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::logging::Logger;
use crate::types::{ChatMessage, ModelResponse, Tool};
use super::error::ProviderResult;
use super::traits::Provider;

/// Backoff settings for rate-limited model calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`
    pub max_retries: u32,
    /// Base delay, doubled on every attempt
    pub retry_delay: Duration,
    /// Upper bound for any single wait, jitter included
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            max_delay,
        }
    }

    /// Total number of attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after `attempt` (0-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt, 0.0)
    }

    /// `min(retry_delay * 2^attempt + jitter, max_delay)`
    ///
    /// `jitter` is a number of seconds, expected in `[0, 1)`.
    pub fn delay_for_attempt(&self, attempt: u32, jitter: f64) -> Duration {
        // 2^1023 is the largest finite power; the cap applies long before
        let exponent = attempt.min(1023) as i32;
        let unbounded = self.retry_delay.as_secs_f64() * 2f64.powi(exponent) + jitter;
        let capped = unbounded.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Source of the additive jitter, in seconds
pub trait Jitter: Send + Sync {
    fn sample(&self) -> f64;
}

/// Uniform jitter in `[0, 1)` seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Constant jitter, for deterministic tests
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Suspends the current task; injected so tests need not wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wraps a provider with the rate-limit retry policy
///
/// Only rate-limit failures are retried. Anything else is returned on
/// first occurrence. When every attempt is rate limited, the last error
/// is returned.
pub struct RetryingInvoker {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
    jitter: Arc<dyn Jitter>,
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn Logger>,
}

impl RetryingInvoker {
    /// Create an invoker with random jitter and real sleeps
    pub fn new(provider: Arc<dyn Provider>, policy: RetryPolicy, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            policy,
            jitter: Arc::new(RandomJitter),
            sleeper: Arc::new(TokioSleeper),
            logger,
        }
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The sleeper, shared with callers that pace their own work
    pub fn sleeper(&self) -> Arc<dyn Sleeper> {
        Arc::clone(&self.sleeper)
    }

    /// Run one model call under the retry policy
    pub async fn invoke(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse> {
        let mut attempt = 0;

        loop {
            match self.provider.complete(messages, tools).await {
                Ok(response) => return Ok(response),
                Err(error) if error.is_rate_limited() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for_attempt(attempt, self.jitter.sample());
                    crate::log_warn!(
                        self.logger,
                        "[RetryingInvoker] {} rate limited (attempt {}/{}), retrying in {:.2}s: {}",
                        self.provider.name(),
                        attempt + 1,
                        self.policy.max_attempts(),
                        delay.as_secs_f64(),
                        error
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    if error.is_rate_limited() {
                        crate::log_error!(
                            self.logger,
                            "[RetryingInvoker] {} still rate limited after {} attempts",
                            self.provider.name(),
                            self.policy.max_attempts()
                        );
                    }
                    return Err(error);
                }
            }
        }
    }
}
