//! Per-turn engine errors

use thiserror::Error;

use crate::providers::ProviderError;

/// Why a turn ended without a final answer
///
/// History keeps whatever the turn appended before failing.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("model is rate limited: {0}")]
    RateLimited(#[source] ProviderError),

    #[error("model call failed: {0}")]
    ModelInvocation(#[source] ProviderError),

    #[error("stopped after {limit} model calls without a final answer")]
    IterationLimit { limit: u32 },
}

impl From<ProviderError> for EngineError {
    fn from(error: ProviderError) -> Self {
        if error.is_rate_limited() {
            EngineError::RateLimited(error)
        } else {
            EngineError::ModelInvocation(error)
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
