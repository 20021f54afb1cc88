//! Invitation-gated account provisioning for a property-management portal.
//!
//! - [`invitations`]: single-use, hashed, expiring invitation tokens
//! - [`provisioning`]: the signup saga and membership repair
//! - [`resilience`]: classified retry with exponential backoff
//! - [`membership`]: idempotent property membership projection
//! - [`repository`]: storage and identity traits, plus in-memory mocks
//!
//! Logging goes through the `log` facade under the `leasehold` target.
//! Enable the `tracing` feature for spans on every operation.

pub mod audit;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod invitations;
pub mod membership;
pub mod provisioning;
pub mod repository;
pub mod resilience;
pub mod validators;

mod error;
mod roles;
mod secret;

pub use error::PortalError;
pub use roles::{Actor, UserRole};
pub use secret::SecretString;

pub use config::PortalConfig;
pub use invitations::InvitationManager;
pub use provisioning::{ProvisioningSaga, SignupOutcome, SignupRequest, SignupWarning};
pub use repository::{StoreError, StoreErrorCode};
pub use resilience::{ResilientExecutor, RetryPolicy};
