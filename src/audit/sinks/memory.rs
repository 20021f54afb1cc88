#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::audit::{AuditEvent, AuditSink, AuditSinkError};

/// Keeps every recorded event in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    pub recorded: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.recorded.lock().unwrap().clone()
    }

    /// Recorded events whose action equals `action`.
    pub fn with_action(&self, action: &str) -> Vec<AuditEvent> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditSinkError> {
        self.recorded.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A sink that rejects every event.
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _event: &AuditEvent) -> Result<(), AuditSinkError> {
        Err(AuditSinkError("audit collection unreachable".to_owned()))
    }
}
