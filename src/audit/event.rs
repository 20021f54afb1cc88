use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action names carried by [`AuditEvent::action`].
pub mod actions {
    pub const INVITE_CREATED: &str = "invite.created";
    pub const INVITE_CONSUMED: &str = "invite.consumed";
    pub const INVITE_EXPIRED: &str = "invite.expired";
    pub const INVITE_REVERTED: &str = "invite.reverted";
    pub const INVITE_DENIED: &str = "invite.denied";
    pub const INVITES_SWEPT: &str = "invite.swept";
    pub const STORAGE_RETRY: &str = "storage.retry";
    pub const SIGNUP_COMPLETED: &str = "signup.completed";
    pub const SIGNUP_FAILED: &str = "signup.failed";
    pub const CHECKPOINT: &str = "provisioning.checkpoint";
    pub const COMPENSATED: &str = "provisioning.compensated";
    pub const COMPENSATION_FAILED: &str = "provisioning.compensation_failed";
    pub const MEMBERSHIP_LINKED: &str = "membership.linked";
    pub const MEMBERSHIP_DEGRADED: &str = "membership.link_degraded";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// The matching `log` level.
    pub fn log_level(&self) -> log::Level {
        match self {
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error | Self::Critical => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured audit record.
///
/// Sinks receive these fire-and-forget; see [`AuditTrail`](super::AuditTrail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub severity: Severity,
    pub metadata: Value,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an `info` event with empty metadata.
    ///
    /// `at` is provisional; [`AuditTrail::record`](super::AuditTrail::record)
    /// restamps it from the trail's clock.
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            severity: Severity::Info,
            metadata: Value::Null,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reads a string field out of the metadata object.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let event = AuditEvent::new("uid-1", actions::INVITE_CREATED, "invitation", "abc");

        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.metadata, Value::Null);
        assert_eq!(event.action, "invite.created");
    }

    #[test]
    fn test_metadata_lookup() {
        let event = AuditEvent::new("system", actions::STORAGE_RETRY, "operation", "op")
            .with_severity(Severity::Warning)
            .with_metadata(json!({ "code": "unavailable", "attempt": 1 }));

        assert_eq!(event.meta_str("code"), Some("unavailable"));
        assert_eq!(event.meta_str("attempt"), None);
        assert_eq!(event.metadata["attempt"], 1);
    }

    #[test]
    fn test_severity_ordering_and_levels() {
        assert!(Severity::Critical > Severity::Warning);
        assert_eq!(Severity::Warning.log_level(), log::Level::Warn);
        assert_eq!(Severity::Critical.log_level(), log::Level::Error);
    }

    #[test]
    fn test_serializes_lowercase_severity() {
        let event = AuditEvent::new("a", "b", "c", "d").with_severity(Severity::Error);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["severity"], "error");
    }
}
