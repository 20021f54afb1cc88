use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::UserRole;

/// Onboarding progress shown by the portal's first-run wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingFlags {
    pub completed: bool,
    pub profile_confirmed: bool,
    pub property_linked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            language: "en".to_owned(),
        }
    }
}

/// Portal profile, keyed by the identity uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub onboarding: OnboardingFlags,
    pub linked_property_id: Option<String>,
    pub linked_unit_id: Option<String>,
    pub invite_id: Option<String>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Writes a new profile. Fails with `already-exists` if one is present.
    async fn create(&self, profile: &UserProfile) -> Result<(), StoreError>;

    async fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Removes a profile. Deleting a missing profile is not an error.
    async fn delete(&self, uid: &str) -> Result<(), StoreError>;
}
