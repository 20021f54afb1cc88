//! Repository traits and data types.
//!
//! This module defines the storage and identity abstractions the provisioning
//! flow runs against. Implement these traits over your document store and
//! identity service.
//!
//! # Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`InvitationRepository`] | Invitation records and the conditional status update |
//! | [`ProfileRepository`] | User profiles keyed by identity uid |
//! | [`PropertyRepository`] | Property membership with versioned writes |
//! | [`IdentityProvider`] | External authentication principals |
//!
//! # Errors
//!
//! Every call returns [`StoreError`]. Translate provider codes with
//! [`StoreErrorCode::from_provider_code`] at the boundary.
//!
//! # Mock Implementations
//!
//! Enable the `mocks` feature for in-memory implementations with scripted
//! failures ([`FaultPlan`]):
//!
//! - [`MockInvitationRepository`]
//! - [`MockProfileRepository`]
//! - [`MockPropertyRepository`]
//! - [`MockIdentityProvider`]

mod error;
mod identity;
mod invitation;
mod profile;
mod property;

#[cfg(any(test, feature = "mocks"))]
mod fault_mock;
#[cfg(any(test, feature = "mocks"))]
mod identity_mock;
#[cfg(any(test, feature = "mocks"))]
mod invitation_mock;
#[cfg(any(test, feature = "mocks"))]
mod profile_mock;
#[cfg(any(test, feature = "mocks"))]
mod property_mock;

pub use error::StoreError;
pub use error::StoreErrorCode;
pub use identity::Identity;
pub use identity::IdentityProvider;
pub use invitation::Invitation;
pub use invitation::InvitationPatch;
pub use invitation::InvitationRepository;
pub use invitation::InvitationStatus;
pub use profile::OnboardingFlags;
pub use profile::Preferences;
pub use profile::ProfileRepository;
pub use profile::UserProfile;
pub use property::Property;
pub use property::PropertyMembership;
pub use property::PropertyRepository;
pub use property::Unit;

#[cfg(any(test, feature = "mocks"))]
pub use fault_mock::FaultPlan;
#[cfg(any(test, feature = "mocks"))]
pub use identity_mock::MockIdentityProvider;
#[cfg(any(test, feature = "mocks"))]
pub use invitation_mock::MockInvitationRepository;
#[cfg(any(test, feature = "mocks"))]
pub use profile_mock::MockProfileRepository;
#[cfg(any(test, feature = "mocks"))]
pub use property_mock::MockPropertyRepository;
