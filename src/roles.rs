//! Portal roles and the acting principal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Roles a portal account can hold.
///
/// Stored as lowercase strings (`"owner"`, `"admin"`, `"pmc"`, `"tenant"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Property owner.
    Owner,
    /// Portal administrator.
    Admin,
    /// Property-management company acting for an owner.
    Pmc,
    /// Resident of a unit.
    Tenant,
}

impl UserRole {
    /// Convert to string for storage and links.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Pmc => "pmc",
            Self::Tenant => "tenant",
        }
    }

    /// Parse from a stored or requested role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "pmc" => Some(Self::Pmc),
            "tenant" => Some(Self::Tenant),
            _ => None,
        }
    }

    /// Whether self-service signup with this role needs an invitation.
    pub fn requires_invite(&self) -> bool {
        matches!(self, Self::Pmc | Self::Tenant)
    }

    /// Whether an account with this role may sign up at all.
    ///
    /// Admin accounts are provisioned out of band.
    pub fn allows_signup(&self) -> bool {
        !matches!(self, Self::Admin)
    }

    /// Whether a holder of `self` may issue an invitation for `invitee`.
    pub fn can_invite(&self, invitee: UserRole) -> bool {
        match invitee {
            Self::Pmc => matches!(self, Self::Owner | Self::Admin),
            Self::Tenant => matches!(self, Self::Owner | Self::Pmc | Self::Admin),
            Self::Owner | Self::Admin => false,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub role: UserRole,
    /// Set while an administrator is impersonating another account.
    pub ghost_session: bool,
}

impl Actor {
    pub fn new(uid: impl Into<String>, role: UserRole) -> Self {
        Self {
            uid: uid.into(),
            role,
            ghost_session: false,
        }
    }

    /// Marks the actor as acting inside an impersonation session.
    #[must_use]
    pub fn impersonating(mut self) -> Self {
        self.ghost_session = true;
        self
    }
}
