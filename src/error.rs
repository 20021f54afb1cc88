use crate::config::ConfigError;
use crate::provisioning::MembershipLinkError;
use crate::repository::StoreError;
use crate::validators::ValidationError;

/// Domain errors returned by invitation and provisioning operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortalError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invitation not found")]
    InviteNotFound,
    #[error("invitation has expired")]
    InviteExpired,
    #[error("invitation has already been used")]
    InviteAlreadyUsed,
    /// A conditional redemption lost to a concurrent redemption.
    #[error("invitation was redeemed concurrently")]
    InviteConflict,
    #[error("could not create account: {0}")]
    IdentityCreateFailed(StoreError),
    #[error("could not create profile: {0}")]
    ProfileCreateFailed(StoreError),
    #[error("profile not found: {0}")]
    ProfileNotFound(String),
    #[error("membership link failed: {0}")]
    MembershipLink(#[from] MembershipLinkError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PortalError {
    /// Stable category name for audit metadata.
    pub fn category(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::InviteNotFound => "invite_not_found",
            Self::InviteExpired => "invite_expired",
            Self::InviteAlreadyUsed => "invite_already_used",
            Self::InviteConflict => "invite_conflict",
            Self::IdentityCreateFailed(_) => "identity_create_failed",
            Self::ProfileCreateFailed(_) => "profile_create_failed",
            Self::ProfileNotFound(_) => "profile_not_found",
            Self::MembershipLink(_) => "membership_link",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }

    /// Message safe to show to the person signing up.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => {
                "You don't have permission to do that. Ask your property manager for an invitation link.".to_owned()
            }
            Self::InviteNotFound => "This invitation link is not valid.".to_owned(),
            Self::InviteExpired => {
                "This invitation link has expired. Ask for a new one.".to_owned()
            }
            Self::InviteAlreadyUsed | Self::InviteConflict => {
                "This invitation link has already been used.".to_owned()
            }
            Self::IdentityCreateFailed(e) if e.code == crate::StoreErrorCode::AlreadyExists => {
                "An account with this email already exists. Try signing in.".to_owned()
            }
            Self::IdentityCreateFailed(_) | Self::ProfileCreateFailed(_) => {
                "We couldn't create your account. Please try again.".to_owned()
            }
            Self::Validation(e) => e.to_string(),
            Self::ProfileNotFound(_)
            | Self::MembershipLink(_)
            | Self::Storage(_)
            | Self::Config(_) => {
                "Something went wrong on our side. Please try again shortly.".to_owned()
            }
        }
    }
}
