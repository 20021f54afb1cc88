//! Single-use invitations.
//!
//! Owners and managers hand out invitation links; the raw token in the link
//! is shown once and only its SHA-256 digest is stored, as the invitation's
//! id. An invitation moves `active -> used` on redemption and
//! `active -> expired` once past its expiry. A failed signup can move it
//! back from `used` to `active`.

mod link;
mod manager;
mod types;

pub use link::{redemption_link, SignupSurface};
pub use manager::InvitationManager;
pub use types::{GenerateInvitation, GeneratedInvitation};
