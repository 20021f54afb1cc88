//! Configuration types.
//!
//! # Example
//!
//! ```rust
//! use leasehold::config::{InvitationConfig, PortalConfig};
//!
//! // Use defaults
//! let config = PortalConfig::default();
//! assert_eq!(config.invitations.expiry_days, 7);
//!
//! // Or customize
//! let config = PortalConfig {
//!     invitations: InvitationConfig {
//!         link_base_url: "https://portal.example.com".to_owned(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::crypto::DEFAULT_TOKEN_LENGTH;
use crate::resilience::RetryPolicy;
use crate::validators::PasswordPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub invitations: InvitationConfig,
    pub retry: RetryPolicy,
    pub provisioning: ProvisioningConfig,
}

impl PortalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local development: short retry delays and a localhost link base.
    pub fn development() -> Self {
        Self {
            invitations: InvitationConfig {
                link_base_url: "http://localhost:3000".to_owned(),
                ..InvitationConfig::default()
            },
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: std::time::Duration::from_millis(50),
                max_jitter: std::time::Duration::from_millis(10),
            },
            provisioning: ProvisioningConfig::default(),
        }
    }

    /// Longer tokens and a strict password policy.
    pub fn strict() -> Self {
        Self {
            invitations: InvitationConfig {
                token_length: 48,
                ..InvitationConfig::default()
            },
            retry: RetryPolicy::default(),
            provisioning: ProvisioningConfig {
                password_policy: PasswordPolicy::strict(),
                ..ProvisioningConfig::default()
            },
        }
    }
}

/// Configuration for invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    /// Number of days until an invitation expires. Default: 7
    pub expiry_days: i64,
    /// Raw token length in characters. Default: 32
    pub token_length: usize,
    /// Origin that redemption links are built on, without a trailing slash.
    pub link_base_url: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            token_length: DEFAULT_TOKEN_LENGTH,
            link_base_url: "https://portal.example.com".to_owned(),
        }
    }
}

/// Configuration values that cannot be used as given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invitation expiry must be a positive number of days, got {0}")]
    InvalidExpiryDays(i64),
}

impl InvitationConfig {
    /// How long a new invitation stays redeemable.
    ///
    /// Zero, negative, or out-of-range `expiry_days` is a [`ConfigError`].
    pub fn expiry(&self) -> Result<Duration, ConfigError> {
        if self.expiry_days <= 0 {
            return Err(ConfigError::InvalidExpiryDays(self.expiry_days));
        }
        Duration::try_days(self.expiry_days).ok_or(ConfigError::InvalidExpiryDays(self.expiry_days))
    }
}

/// Configuration for the account provisioning flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Versioned property writes attempted before membership linking is
    /// reported as degraded. Default: 3
    pub membership_write_attempts: u32,
    pub password_policy: PasswordPolicy,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            membership_write_attempts: 3,
            password_policy: PasswordPolicy::default(),
        }
    }
}
