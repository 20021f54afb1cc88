use async_trait::async_trait;

use crate::audit::{AuditEvent, AuditSink, AuditSinkError};

/// Writes audit events through the `log` crate.
///
/// By default each event is logged at the level matching its severity.
///
/// # Example
///
/// ```rust,ignore
/// use leasehold::audit::{AuditTrail, LoggingSink};
///
/// let trail = AuditTrail::new().with_sink(LoggingSink::new());
/// ```
pub struct LoggingSink {
    level: Option<log::Level>,
}

impl LoggingSink {
    /// Creates a sink that logs at each event's own severity.
    pub fn new() -> Self {
        Self { level: None }
    }

    /// Creates a sink that logs every event at `level`.
    pub fn with_level(level: log::Level) -> Self {
        Self { level: Some(level) }
    }

    fn level_for(&self, event: &AuditEvent) -> log::Level {
        self.level.unwrap_or_else(|| event.severity.log_level())
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for LoggingSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        log::log!(
            target: "leasehold::audit",
            self.level_for(event),
            "action={} actor_id={} entity={}/{} severity={} metadata={}",
            event.action,
            event.actor_id,
            event.entity_type,
            event.entity_id,
            event.severity,
            event.metadata
        );
        Ok(())
    }
}
