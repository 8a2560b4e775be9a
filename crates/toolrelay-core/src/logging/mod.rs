//! Logging abstractions
//!
//! Components log through the `Logger` trait so tests can stay silent;
//! the default implementation forwards to `tracing`.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::{Logger, LoggerExt, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::{init_tracing, TracingLogger, LOG_TARGET};
