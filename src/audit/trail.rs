use std::sync::Arc;

use super::{AuditEvent, AuditSink};
use crate::clock::{Clock, SystemClock};

/// Fans audit events out to every registered sink.
///
/// Recording never fails: a sink error is logged locally and dropped. An
/// empty trail is a no-op. Clones share the same sinks and clock.
///
/// Events are timestamped from the trail's clock when recorded.
#[derive(Clone)]
pub struct AuditTrail {
    sinks: Vec<Arc<dyn AuditSink>>,
    clock: Arc<dyn Clock>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self {
            sinks: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp events from `clock` instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Register a sink. Sinks are called in the order they are registered.
    #[must_use]
    pub fn with_sink(mut self, sink: impl AuditSink) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Register a sink that the caller keeps a handle to.
    #[must_use]
    pub fn with_shared_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub async fn record(&self, mut event: AuditEvent) {
        event.at = self.clock.now();

        for sink in &self.sinks {
            if let Err(e) = sink.record(&event).await {
                log::warn!(
                    target: "leasehold",
                    "msg=\"audit sink failed\", action=\"{}\", entity_id=\"{}\", error=\"{e}\"",
                    event.action,
                    event.entity_id
                );
            }
        }
    }
}
