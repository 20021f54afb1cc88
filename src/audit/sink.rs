use async_trait::async_trait;

use super::AuditEvent;

/// Error reported by an audit sink. Never escalates past [`AuditTrail`](super::AuditTrail).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audit sink failed: {0}")]
pub struct AuditSinkError(pub String);

/// Destination for audit events.
///
/// Implement this to forward events to an audit collection, an alerting
/// pipeline, or anything else.
///
/// # Example
///
/// ```rust,ignore
/// use leasehold::audit::{AuditEvent, AuditSink, AuditSinkError, Severity};
/// use async_trait::async_trait;
///
/// struct PagerSink;
///
/// #[async_trait]
/// impl AuditSink for PagerSink {
///     async fn record(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
///         if event.severity >= Severity::Critical {
///             // page someone
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditSinkError>;
}
