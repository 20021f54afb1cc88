//! End-to-end invitation lifecycle: issue, list, redeem, revert, expire.
//!
//! Run with: `cargo test --test e2e_invitations`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use chrono::Duration;

use leasehold::audit::{actions, AuditTrail, MemoryAuditSink};
use leasehold::clock::ManualClock;
use leasehold::config::InvitationConfig;
use leasehold::invitations::GenerateInvitation;
use leasehold::repository::{InvitationStatus, MockInvitationRepository, StoreError};
use leasehold::resilience::{FixedJitter, RecordingSleeper};
use leasehold::{
    Actor, InvitationManager, PortalError, ResilientExecutor, RetryPolicy, SecretString, UserRole,
};

fn manager() -> (
    InvitationManager<MockInvitationRepository>,
    MockInvitationRepository,
    ManualClock,
    MemoryAuditSink,
) {
    let repo = MockInvitationRepository::new();
    let clock = ManualClock::starting_now();
    let audit = MemoryAuditSink::new();
    let executor = ResilientExecutor::with_sources(
        RetryPolicy::default(),
        RecordingSleeper::new(),
        FixedJitter::default(),
        AuditTrail::new().with_sink(audit.clone()),
    );
    let config = InvitationConfig {
        link_base_url: "https://homes.example.org".to_owned(),
        ..InvitationConfig::default()
    };
    let manager = InvitationManager::new(repo.clone(), executor, Arc::new(clock.clone()), config);
    (manager, repo, clock, audit)
}

fn owner() -> Actor {
    Actor::new("owner-1", UserRole::Owner)
}

#[tokio::test]
async fn test_manager_workflow() {
    let (manager, repo, clock, audit) = manager();

    let pmc = manager
        .generate(&owner(), GenerateInvitation::pmc("P1"))
        .await
        .unwrap();
    assert!(pmc
        .link
        .expose_secret()
        .starts_with("https://homes.example.org/owner/signup?invite="));
    assert!(pmc.link.expose_secret().ends_with("&role=pmc"));

    // the invited manager can now invite tenants
    let manager_actor = Actor::new("uid-mgr", UserRole::Pmc);
    let tenant = manager
        .generate(&manager_actor, GenerateInvitation::tenant("P1", Some("U4")))
        .await
        .unwrap();
    assert_eq!(tenant.invitation.created_by, "uid-mgr");
    assert!(tenant
        .link
        .expose_secret()
        .starts_with("https://homes.example.org/tenant/signup?invite="));

    assert_eq!(manager.list_active("P1").await.unwrap().len(), 2);

    manager.consume(&pmc.invitation.id, "uid-mgr").await.unwrap();
    assert_eq!(manager.list_active("P1").await.unwrap().len(), 1);

    clock.advance(Duration::days(7) + Duration::seconds(1));
    assert!(manager.list_active("P1").await.unwrap().is_empty());
    assert_eq!(manager.sweep_expired().await.unwrap(), 1);

    assert_eq!(
        repo.get(&tenant.invitation.id).unwrap().status,
        InvitationStatus::Expired
    );
    assert_eq!(
        repo.get(&pmc.invitation.id).unwrap().status,
        InvitationStatus::Used
    );
    assert_eq!(
        manager.validate(&tenant.token).await.unwrap_err(),
        PortalError::InviteExpired
    );
    assert_eq!(audit.with_action(actions::INVITES_SWEPT).len(), 1);
}

#[tokio::test]
async fn test_validate_at_exact_expiry() {
    let (manager, _, clock, _) = manager();
    let out = manager
        .generate(&owner(), GenerateInvitation::tenant("P1", None))
        .await
        .unwrap();

    clock.advance(Duration::days(7) - Duration::seconds(1));
    assert!(manager.validate(&out.token).await.is_ok());

    clock.advance(Duration::seconds(1));
    assert_eq!(
        manager.validate(&out.token).await.unwrap_err(),
        PortalError::InviteExpired
    );
}

#[tokio::test]
async fn test_expired_invitation_cannot_be_consumed() {
    let (manager, repo, clock, _) = manager();
    let out = manager
        .generate(&owner(), GenerateInvitation::tenant("P1", None))
        .await
        .unwrap();

    clock.advance(Duration::days(8));
    assert_eq!(manager.sweep_expired().await.unwrap(), 1);

    assert_eq!(
        manager.consume(&out.invitation.id, "uid-1").await.unwrap_err(),
        PortalError::InviteConflict
    );
    manager.revert(&out.invitation.id).await.unwrap();
    assert_eq!(
        repo.get(&out.invitation.id).unwrap().status,
        InvitationStatus::Expired
    );
}

#[tokio::test]
async fn test_sweep_survives_concurrent_redemption() {
    let (manager, repo, clock, _) = manager();
    let a = manager
        .generate(&owner(), GenerateInvitation::tenant("P1", None))
        .await
        .unwrap();
    let b = manager
        .generate(&owner(), GenerateInvitation::tenant("P1", None))
        .await
        .unwrap();

    // redeemed just before expiry, then the sweep runs late
    manager.consume(&a.invitation.id, "uid-a").await.unwrap();
    clock.advance(Duration::days(9));

    assert_eq!(manager.sweep_expired().await.unwrap(), 1);
    assert_eq!(repo.get(&a.invitation.id).unwrap().status, InvitationStatus::Used);
    assert_eq!(
        repo.get(&b.invitation.id).unwrap().status,
        InvitationStatus::Expired
    );
}

#[tokio::test]
async fn test_storage_outage_surfaces_after_retries() {
    let (manager, repo, _, audit) = manager();
    repo.faults.fail_times(
        "invitations.find_by_id",
        3,
        StoreError::from_provider("firestore/deadline-exceeded", "slow"),
    );

    let err = manager
        .validate(&SecretString::new("anything"))
        .await
        .unwrap_err();

    assert!(matches!(err, PortalError::Storage(_)));
    assert_eq!(repo.faults.calls("invitations.find_by_id"), 3);
    assert_eq!(audit.with_action(actions::STORAGE_RETRY).len(), 2);
}
