use std::fmt;

use crate::{SecretString, UserRole};

/// Which signup screen a redemption link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupSurface {
    /// Owner and property-manager signup.
    Owner,
    /// Resident signup.
    Tenant,
}

impl SignupSurface {
    pub fn for_role(role: UserRole) -> Self {
        match role {
            UserRole::Tenant => Self::Tenant,
            UserRole::Owner | UserRole::Admin | UserRole::Pmc => Self::Owner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Tenant => "tenant",
        }
    }
}

impl fmt::Display for SignupSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `<base>/<surface>/signup?invite=<token>&role=<role>`.
///
/// The link embeds the raw token, so it is returned as a secret.
pub fn redemption_link(base_url: &str, token: &SecretString, role: UserRole) -> SecretString {
    SecretString::new(format!(
        "{}/{}/signup?invite={}&role={}",
        base_url.trim_end_matches('/'),
        SignupSurface::for_role(role),
        token.expose_secret(),
        role
    ))
}
