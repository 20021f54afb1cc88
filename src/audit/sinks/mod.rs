//! Built-in audit sinks.

mod logging;
#[cfg(any(test, feature = "mocks"))]
mod memory;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::LoggingSink;
#[cfg(any(test, feature = "mocks"))]
pub use memory::{FailingAuditSink, MemoryAuditSink};
#[cfg(feature = "tracing")]
pub use self::tracing::TracingSink;
