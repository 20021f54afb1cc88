use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::correlation_id;

/// A step of the signup saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStage {
    PreCheck,
    CreateIdentity,
    ValidateInvite,
    ConsumeInvite,
    PersistProfile,
    LinkMembership,
    Complete,
}

impl SagaStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreCheck => "pre_check",
            Self::CreateIdentity => "create_identity",
            Self::ValidateInvite => "validate_invite",
            Self::ConsumeInvite => "consume_invite",
            Self::PersistProfile => "persist_profile",
            Self::LinkMembership => "link_membership",
            Self::Complete => "complete",
        }
    }

    /// Whether an attempted stage must be undone when the run fails.
    ///
    /// Attempted, not completed: a write can land even though every call
    /// reported an error.
    pub fn is_compensable(&self) -> bool {
        matches!(
            self,
            Self::CreateIdentity | Self::ConsumeInvite | Self::PersistProfile
        )
    }
}

impl fmt::Display for SagaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral state of one saga run.
#[derive(Debug, Clone)]
pub(crate) struct SagaRun {
    pub run_id: String,
    pub uid: Option<String>,
    pub invite_id: Option<String>,
    entered: Vec<SagaStage>,
}

impl SagaRun {
    pub fn start() -> Self {
        Self {
            run_id: correlation_id(),
            uid: None,
            invite_id: None,
            entered: Vec::new(),
        }
    }

    pub fn enter(&mut self, stage: SagaStage) {
        self.entered.push(stage);
    }

    /// The stage being run, or the last one entered.
    pub fn current(&self) -> SagaStage {
        self.entered.last().copied().unwrap_or(SagaStage::PreCheck)
    }

    /// Entered stages that need undoing, most recent first.
    pub fn to_compensate(&self) -> impl Iterator<Item = SagaStage> + '_ {
        self.entered
            .iter()
            .rev()
            .copied()
            .filter(SagaStage::is_compensable)
    }

    pub fn actor(&self) -> &str {
        self.uid.as_deref().unwrap_or("anonymous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensation_order() {
        let mut run = SagaRun::start();
        for stage in [
            SagaStage::PreCheck,
            SagaStage::CreateIdentity,
            SagaStage::ValidateInvite,
            SagaStage::ConsumeInvite,
            SagaStage::PersistProfile,
        ] {
            run.enter(stage);
        }

        let undo: Vec<_> = run.to_compensate().collect();
        assert_eq!(
            undo,
            vec![
                SagaStage::PersistProfile,
                SagaStage::ConsumeInvite,
                SagaStage::CreateIdentity
            ]
        );
        assert_eq!(run.current(), SagaStage::PersistProfile);
    }

    #[test]
    fn test_fresh_run() {
        let run = SagaRun::start();
        assert_eq!(run.current(), SagaStage::PreCheck);
        assert_eq!(run.actor(), "anonymous");
        assert_eq!(run.to_compensate().count(), 0);
        assert_eq!(run.run_id.len(), 12);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(SagaStage::LinkMembership.to_string(), "link_membership");
        assert_eq!(
            serde_json::to_string(&SagaStage::PersistProfile).unwrap(),
            "\"persist_profile\""
        );
    }
}
