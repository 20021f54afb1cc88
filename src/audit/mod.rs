//! Structured audit events.
//!
//! Invitation and provisioning operations report what they did (and what
//! they undid) as [`AuditEvent`]s. Events go to an [`AuditTrail`], which fans
//! them out to its [`AuditSink`]s and swallows sink failures, so auditing can
//! never fail the operation that produced the event.
//!
//! # Quick Start
//!
//! ```rust
//! use leasehold::audit::{AuditTrail, LoggingSink};
//!
//! let trail = AuditTrail::new().with_sink(LoggingSink::new());
//! assert!(!trail.is_empty());
//! ```

mod event;
mod sink;
mod trail;

pub mod sinks;

pub use event::{actions, AuditEvent, Severity};
pub use sink::{AuditSink, AuditSinkError};
pub use sinks::LoggingSink;
#[cfg(any(test, feature = "mocks"))]
pub use sinks::{FailingAuditSink, MemoryAuditSink};
#[cfg(feature = "tracing")]
pub use sinks::TracingSink;
pub use trail::AuditTrail;
