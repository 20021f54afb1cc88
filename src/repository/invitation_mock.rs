#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::fault_mock::FaultPlan;
use super::invitation::{Invitation, InvitationPatch, InvitationRepository, InvitationStatus};
use super::StoreError;

/// In-memory invitation store.
///
/// `update_if_status` checks and writes under one write lock, which gives
/// the same at-most-one guarantee as a store-side conditional update.
#[derive(Clone, Default)]
pub struct MockInvitationRepository {
    pub invitations: Arc<RwLock<HashMap<String, Invitation>>>,
    pub faults: FaultPlan,
}

impl MockInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a record directly, bypassing fault injection.
    pub fn get(&self, id: &str) -> Option<Invitation> {
        self.invitations.read().unwrap().get(id).cloned()
    }

    pub fn insert(&self, invitation: Invitation) {
        self.invitations
            .write()
            .unwrap()
            .insert(invitation.id.clone(), invitation);
    }
}

#[async_trait]
impl InvitationRepository for MockInvitationRepository {
    async fn create(&self, invitation: &Invitation) -> Result<(), StoreError> {
        self.faults.check("invitations.create")?;

        let mut invitations = self.invitations.write().unwrap();
        if invitations.contains_key(&invitation.id) {
            return Err(StoreError::already_exists(format!(
                "invitation {} already exists",
                invitation.id
            )));
        }
        invitations.insert(invitation.id.clone(), invitation.clone());
        drop(invitations);

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, StoreError> {
        self.faults.check("invitations.find_by_id")?;
        Ok(self.get(id))
    }

    async fn find_active_by_property(
        &self,
        property_id: &str,
    ) -> Result<Vec<Invitation>, StoreError> {
        self.faults.check("invitations.find_active_by_property")?;

        let invitations = self.invitations.read().unwrap();
        let mut found: Vec<Invitation> = invitations
            .values()
            .filter(|i| i.property_id == property_id && i.status == InvitationStatus::Active)
            .cloned()
            .collect();
        drop(invitations);

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_active_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Invitation>, StoreError> {
        self.faults.check("invitations.find_active_expired")?;

        let invitations = self.invitations.read().unwrap();
        let found = invitations
            .values()
            .filter(|i| i.status == InvitationStatus::Active && i.is_expired_at(now))
            .cloned()
            .collect();
        drop(invitations);

        Ok(found)
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: InvitationStatus,
        redeemed_by: Option<&str>,
        patch: InvitationPatch,
    ) -> Result<Option<Invitation>, StoreError> {
        self.faults.check("invitations.update_if_status")?;

        let mut invitations = self.invitations.write().unwrap();
        let Some(invitation) = invitations.get_mut(id) else {
            return Ok(None);
        };

        if invitation.status != expected {
            return Ok(None);
        }

        if redeemed_by.is_some() && invitation.used_by.as_deref() != redeemed_by {
            return Ok(None);
        }

        invitation.status = patch.status;
        invitation.used_at = patch.used_at;
        invitation.used_by = patch.used_by;

        Ok(Some(invitation.clone()))
    }
}
