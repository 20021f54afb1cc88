use crate::repository::Invitation;
use crate::{SecretString, UserRole};

/// Input data for creating an invitation.
#[derive(Debug, Clone)]
pub struct GenerateInvitation {
    pub role: UserRole,
    pub property_id: String,
    pub unit_id: Option<String>,
    pub target_email: Option<String>,
}

impl GenerateInvitation {
    pub fn tenant(property_id: impl Into<String>, unit_id: Option<&str>) -> Self {
        Self {
            role: UserRole::Tenant,
            property_id: property_id.into(),
            unit_id: unit_id.map(str::to_owned),
            target_email: None,
        }
    }

    pub fn pmc(property_id: impl Into<String>) -> Self {
        Self {
            role: UserRole::Pmc,
            property_id: property_id.into(),
            unit_id: None,
            target_email: None,
        }
    }

    #[must_use]
    pub fn for_email(mut self, email: impl Into<String>) -> Self {
        self.target_email = Some(email.into());
        self
    }
}

/// Output from creating an invitation.
#[derive(Debug)]
pub struct GeneratedInvitation {
    /// The stored record.
    pub invitation: Invitation,
    /// The raw token (not stored, only returned once).
    pub token: SecretString,
    /// Redemption link embedding the raw token.
    pub link: SecretString,
}
