use serde::Deserialize;

use super::link::MembershipLinkError;
use crate::repository::{Identity, UserProfile};
use crate::{SecretString, UserRole};

/// A signup submitted from one of the portal's signup pages.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    /// Role chosen on the signup page. An invitation's role overrides it.
    pub role: UserRole,
    #[serde(default)]
    pub invite_token: Option<SecretString>,
}

impl SignupRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<SecretString>,
        name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            role,
            invite_token: None,
        }
    }

    #[must_use]
    pub fn with_invite(mut self, token: impl Into<SecretString>) -> Self {
        self.invite_token = Some(token.into());
        self
    }

    /// The invite token, treating an empty one as absent.
    pub fn invite(&self) -> Option<&SecretString> {
        self.invite_token.as_ref().filter(|t| !t.is_empty())
    }
}

/// Soft failures that do not fail the signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupWarning {
    /// The account exists but is not yet listed on its property.
    /// Repair with `ProvisioningSaga::relink_membership`.
    MembershipLinkDegraded {
        property_id: String,
        error: MembershipLinkError,
    },
}

#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub identity: Identity,
    pub profile: UserProfile,
    pub warnings: Vec<SignupWarning>,
}

impl SignupOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
