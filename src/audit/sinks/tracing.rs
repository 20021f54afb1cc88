use async_trait::async_trait;

use crate::audit::{AuditEvent, AuditSink, AuditSinkError, Severity};

/// Emits audit events as tracing events.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        match event.severity {
            Severity::Info => tracing::info!(
                target: "leasehold::audit",
                action = %event.action,
                actor_id = %event.actor_id,
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                metadata = %event.metadata,
                "audit event"
            ),
            Severity::Warning => tracing::warn!(
                target: "leasehold::audit",
                action = %event.action,
                actor_id = %event.actor_id,
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                metadata = %event.metadata,
                "audit event"
            ),
            Severity::Error | Severity::Critical => tracing::error!(
                target: "leasehold::audit",
                action = %event.action,
                actor_id = %event.actor_id,
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                severity = %event.severity,
                metadata = %event.metadata,
                "audit event"
            ),
        }
        Ok(())
    }
}
