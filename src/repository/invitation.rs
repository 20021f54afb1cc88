use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::UserRole;

/// Lifecycle state of an invitation.
///
/// `Active` moves to `Used` or `Expired`. The only way back is the
/// provisioning saga's compensating revert of `Used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Active,
    Used,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

/// A single-use invitation to join a property.
///
/// `id` is the SHA-256 hex digest of the raw token. The raw token itself is
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub role: UserRole,
    pub property_id: String,
    pub unit_id: Option<String>,
    pub target_email: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<String>,
}

impl Invitation {
    /// Check if the invitation has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Active and not yet past its expiry.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Active && !self.is_expired_at(now)
    }
}

/// Fields written by a conditional status transition.
///
/// `used_at` and `used_by` are written verbatim, so `None` clears them.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationPatch {
    pub status: InvitationStatus,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<String>,
}

impl InvitationPatch {
    pub fn redeem(uid: &str, at: DateTime<Utc>) -> Self {
        Self {
            status: InvitationStatus::Used,
            used_at: Some(at),
            used_by: Some(uid.to_owned()),
        }
    }

    pub fn expire() -> Self {
        Self {
            status: InvitationStatus::Expired,
            used_at: None,
            used_by: None,
        }
    }

    pub fn reactivate() -> Self {
        Self {
            status: InvitationStatus::Active,
            used_at: None,
            used_by: None,
        }
    }
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Persists a new invitation. Fails with `already-exists` on id collision.
    async fn create(&self, invitation: &Invitation) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, StoreError>;

    async fn find_active_by_property(
        &self,
        property_id: &str,
    ) -> Result<Vec<Invitation>, StoreError>;

    /// Active invitations whose `expires_at` is at or before `now`.
    async fn find_active_expired(&self, now: DateTime<Utc>)
    -> Result<Vec<Invitation>, StoreError>;

    /// Atomic conditional update: applies `patch` only if the stored status
    /// equals `expected` and, when `redeemed_by` is given, the stored
    /// `used_by` equals it. Both checks and the write are one storage
    /// primitive.
    ///
    /// Returns the updated record, or `None` when the precondition did not
    /// hold or the record does not exist.
    async fn update_if_status(
        &self,
        id: &str,
        expected: InvitationStatus,
        redeemed_by: Option<&str>,
        patch: InvitationPatch,
    ) -> Result<Option<Invitation>, StoreError>;
}
