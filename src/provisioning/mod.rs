//! Account provisioning.
//!
//! [`ProvisioningSaga`] turns a signup request into an identity, a profile
//! and a property membership. Stages that fail are compensated in reverse
//! order; see [`SagaStage`] for the sequence.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use leasehold::audit::{AuditTrail, LoggingSink};
//! use leasehold::clock::SystemClock;
//! use leasehold::config::PortalConfig;
//! use leasehold::invitations::InvitationManager;
//! use leasehold::provisioning::{ProvisioningSaga, SignupRequest};
//! use leasehold::repository::{
//!     MockIdentityProvider, MockInvitationRepository, MockProfileRepository,
//!     MockPropertyRepository,
//! };
//! use leasehold::resilience::ResilientExecutor;
//! use leasehold::UserRole;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = PortalConfig::default();
//! let executor = ResilientExecutor::new(
//!     config.retry.clone(),
//!     AuditTrail::new().with_sink(LoggingSink::new()),
//! );
//! let clock = Arc::new(SystemClock);
//!
//! let invitations = InvitationManager::new(
//!     MockInvitationRepository::new(),
//!     executor.clone(),
//!     clock.clone(),
//!     config.invitations.clone(),
//! );
//! let saga = ProvisioningSaga::new(
//!     MockIdentityProvider::new(),
//!     MockProfileRepository::new(),
//!     MockPropertyRepository::new(),
//!     invitations,
//!     executor,
//!     clock,
//!     config.provisioning.clone(),
//! );
//!
//! let outcome = saga
//!     .execute(SignupRequest::new("olu@example.com", "s3cure-pass", "Olu", UserRole::Owner))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.profile.role, UserRole::Owner);
//! # }
//! ```

mod link;
mod saga;
mod stage;
mod types;

pub use link::{LinkOutcome, MembershipLinkError, MembershipLinker};
pub use saga::ProvisioningSaga;
pub use stage::SagaStage;
pub use types::{SignupOutcome, SignupRequest, SignupWarning};
