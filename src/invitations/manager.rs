use std::sync::Arc;

use serde_json::json;

use super::link::redemption_link;
use super::types::{GenerateInvitation, GeneratedInvitation};
use crate::audit::{actions, AuditEvent, Severity};
use crate::clock::Clock;
use crate::config::{ConfigError, InvitationConfig};
use crate::crypto::{generate_token, hash_token};
use crate::repository::{Invitation, InvitationPatch, InvitationRepository, InvitationStatus};
use crate::resilience::ResilientExecutor;
use crate::validators::{normalize_email, validate_email};
use crate::{Actor, PortalError, SecretString, UserRole};

/// Creates, validates, redeems and reverts single-use invitations.
///
/// Every storage call goes through the [`ResilientExecutor`]. Redemption is
/// a single conditional update, so concurrent redemptions of the same token
/// cannot both succeed.
pub struct InvitationManager<R: InvitationRepository> {
    repo: R,
    executor: ResilientExecutor,
    clock: Arc<dyn Clock>,
    config: InvitationConfig,
}

impl<R: InvitationRepository> InvitationManager<R> {
    pub fn new(
        repo: R,
        executor: ResilientExecutor,
        clock: Arc<dyn Clock>,
        config: InvitationConfig,
    ) -> Self {
        Self {
            repo,
            executor,
            clock,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &InvitationConfig {
        &self.config
    }

    /// Link to the signup screen for `role`, on the configured base URL.
    pub fn redemption_link(&self, raw_token: &SecretString, role: UserRole) -> SecretString {
        redemption_link(&self.config.link_base_url, raw_token, role)
    }

    /// Creates an invitation and returns its raw token and redemption link.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - invitation stored; the token is not retrievable later
    /// - `Err(PortalError::PermissionDenied)` - ghost session, or the actor's
    ///   role may not invite this role
    /// - `Err(PortalError::Validation)` - malformed target email
    /// - `Err(PortalError::Config)` - `expiry_days` is not usable
    /// - `Err(PortalError::Storage)` - the write failed after retries
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "generate_invitation", skip_all, err)
    )]
    pub async fn generate(
        &self,
        actor: &Actor,
        input: GenerateInvitation,
    ) -> Result<GeneratedInvitation, PortalError> {
        if actor.ghost_session {
            return Err(self
                .deny(actor, &input, "invitations cannot be created while impersonating")
                .await);
        }

        if !actor.role.can_invite(input.role) {
            let reason = format!("{} accounts cannot invite {} accounts", actor.role, input.role);
            return Err(self.deny(actor, &input, &reason).await);
        }

        let target_email = match input.target_email.as_deref() {
            Some(email) => {
                validate_email(email)?;
                Some(normalize_email(email))
            }
            None => None,
        };

        let now = self.clock.now();
        let expiry = self.config.expiry()?;
        let expires_at = now
            .checked_add_signed(expiry)
            .ok_or(ConfigError::InvalidExpiryDays(self.config.expiry_days))?;
        let token = generate_token(self.config.token_length);

        let invitation = Invitation {
            id: hash_token(token.expose_secret()),
            role: input.role,
            property_id: input.property_id,
            unit_id: input.unit_id,
            target_email,
            status: InvitationStatus::Active,
            expires_at,
            created_by: actor.uid.clone(),
            created_at: now,
            used_at: None,
            used_by: None,
        };

        self.executor
            .execute("invitations.create", || self.repo.create(&invitation))
            .await?;

        log::info!(
            target: "leasehold",
            "msg=\"invitation created\", invitation_id={}, property_id={}, role={}, created_by={}",
            invitation.id,
            invitation.property_id,
            invitation.role,
            invitation.created_by
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new(&actor.uid, actions::INVITE_CREATED, "invitation", &invitation.id)
                    .with_metadata(json!({
                        "role": invitation.role.as_str(),
                        "property_id": invitation.property_id,
                        "unit_id": invitation.unit_id,
                        "expires_at": invitation.expires_at.to_rfc3339(),
                    })),
            )
            .await;

        let link = self.redemption_link(&token, invitation.role);

        Ok(GeneratedInvitation {
            invitation,
            token,
            link,
        })
    }

    /// Looks up an invitation by raw token and checks it can be redeemed.
    ///
    /// An active invitation found past its expiry is flipped to `expired`
    /// as a side effect. Repeated calls keep returning `InviteExpired`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "validate_invitation", skip_all, err)
    )]
    pub async fn validate(&self, raw_token: &SecretString) -> Result<Invitation, PortalError> {
        if raw_token.is_empty() {
            return Err(PortalError::InviteNotFound);
        }

        let id = hash_token(raw_token.expose_secret());
        let invitation = self
            .executor
            .execute("invitations.find_by_id", || self.repo.find_by_id(&id))
            .await?
            .ok_or(PortalError::InviteNotFound)?;

        match invitation.status {
            InvitationStatus::Used => Err(PortalError::InviteAlreadyUsed),
            InvitationStatus::Expired => Err(PortalError::InviteExpired),
            InvitationStatus::Active if invitation.is_expired_at(self.clock.now()) => {
                Err(self.mark_expired(&invitation).await)
            }
            InvitationStatus::Active => Ok(invitation),
        }
    }

    /// Redeems an invitation for `redeemer_uid`.
    ///
    /// One conditional update: status becomes `used` only if it is still
    /// `active`. Losing that race returns `InviteConflict`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "consume_invitation", skip_all, err)
    )]
    pub async fn consume(
        &self,
        invite_id: &str,
        redeemer_uid: &str,
    ) -> Result<Invitation, PortalError> {
        let patch = InvitationPatch::redeem(redeemer_uid, self.clock.now());

        let applied = self
            .executor
            .execute("invitations.consume", || {
                self.repo.update_if_status(
                    invite_id,
                    InvitationStatus::Active,
                    None,
                    patch.clone(),
                )
            })
            .await?;

        let invitation = match applied {
            Some(invitation) => invitation,
            None => self.already_consumed_by(invite_id, redeemer_uid).await?,
        };

        log::info!(
            target: "leasehold",
            "msg=\"invitation consumed\", invitation_id={invite_id}, used_by={redeemer_uid}"
        );

        self.executor
            .audit()
            .record(AuditEvent::new(
                redeemer_uid,
                actions::INVITE_CONSUMED,
                "invitation",
                invite_id,
            ))
            .await;

        Ok(invitation)
    }

    /// Puts a consumed invitation back to `active`, clearing `used_at` and
    /// `used_by`. Reverting an invitation that is not `used` is a no-op.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "revert_invitation", skip_all, err)
    )]
    pub async fn revert(&self, invite_id: &str) -> Result<(), PortalError> {
        self.reactivate(invite_id, None).await
    }

    /// Like [`revert`](Self::revert), but only undoes a redemption made by
    /// `redeemer_uid`. An invitation redeemed by anyone else is left alone.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "revert_redemption", skip_all, err)
    )]
    pub async fn revert_redemption(
        &self,
        invite_id: &str,
        redeemer_uid: &str,
    ) -> Result<(), PortalError> {
        self.reactivate(invite_id, Some(redeemer_uid)).await
    }

    /// Active, unexpired invitations for a property, newest first.
    pub async fn list_active(&self, property_id: &str) -> Result<Vec<Invitation>, PortalError> {
        let now = self.clock.now();
        let invitations = self
            .executor
            .execute("invitations.find_active_by_property", || {
                self.repo.find_active_by_property(property_id)
            })
            .await?;

        Ok(invitations
            .into_iter()
            .filter(|i| i.is_redeemable_at(now))
            .collect())
    }

    /// Marks every active invitation past its expiry as `expired`.
    ///
    /// Run periodically. Returns how many records were transitioned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "sweep_expired_invitations", skip_all, err)
    )]
    pub async fn sweep_expired(&self) -> Result<usize, PortalError> {
        let now = self.clock.now();
        let candidates = self
            .executor
            .execute("invitations.find_active_expired", || {
                self.repo.find_active_expired(now)
            })
            .await?;

        let mut expired = 0;
        for invitation in &candidates {
            let applied = self
                .executor
                .execute("invitations.expire", || {
                    self.repo.update_if_status(
                        &invitation.id,
                        InvitationStatus::Active,
                        None,
                        InvitationPatch::expire(),
                    )
                })
                .await?;

            if applied.is_some() {
                expired += 1;
            }
        }

        log::info!(
            target: "leasehold",
            "msg=\"expired invitations swept\", candidates={}, expired={expired}",
            candidates.len()
        );

        if expired > 0 {
            self.executor
                .audit()
                .record(
                    AuditEvent::new("system", actions::INVITES_SWEPT, "invitation", "*")
                        .with_metadata(json!({ "expired": expired })),
                )
                .await;
        }

        Ok(expired)
    }

    /// A redemption whose conditional write was retried may find its own
    /// earlier write already applied.
    async fn already_consumed_by(
        &self,
        invite_id: &str,
        redeemer_uid: &str,
    ) -> Result<Invitation, PortalError> {
        let current = self
            .executor
            .execute("invitations.find_by_id", || self.repo.find_by_id(invite_id))
            .await?;

        match current {
            Some(invitation)
                if invitation.status == InvitationStatus::Used
                    && invitation.used_by.as_deref() == Some(redeemer_uid) =>
            {
                Ok(invitation)
            }
            Some(_) => {
                log::warn!(
                    target: "leasehold",
                    "msg=\"invitation redemption conflict\", invitation_id={invite_id}, redeemer={redeemer_uid}"
                );
                Err(PortalError::InviteConflict)
            }
            None => Err(PortalError::InviteNotFound),
        }
    }

    async fn reactivate(
        &self,
        invite_id: &str,
        redeemer_uid: Option<&str>,
    ) -> Result<(), PortalError> {
        let reverted = self
            .executor
            .execute("invitations.revert", || {
                self.repo.update_if_status(
                    invite_id,
                    InvitationStatus::Used,
                    redeemer_uid,
                    InvitationPatch::reactivate(),
                )
            })
            .await?;

        if reverted.is_none() {
            log::debug!(
                target: "leasehold",
                "msg=\"invitation revert skipped, not used by this redeemer\", invitation_id={invite_id}, redeemer={}",
                redeemer_uid.unwrap_or("*")
            );
            return Ok(());
        }

        log::warn!(
            target: "leasehold",
            "msg=\"invitation reverted\", invitation_id={invite_id}"
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new("system", actions::INVITE_REVERTED, "invitation", invite_id)
                    .with_severity(Severity::Warning)
                    .with_metadata(json!({ "redeemer": redeemer_uid })),
            )
            .await;

        Ok(())
    }

    /// Flips an overdue active invitation to `expired` and returns the error
    /// `validate` reports for it.
    async fn mark_expired(&self, invitation: &Invitation) -> PortalError {
        let result = self
            .executor
            .execute("invitations.expire", || {
                self.repo.update_if_status(
                    &invitation.id,
                    InvitationStatus::Active,
                    None,
                    InvitationPatch::expire(),
                )
            })
            .await;

        match result {
            Ok(Some(_)) => {
                log::info!(
                    target: "leasehold",
                    "msg=\"invitation expired\", invitation_id={}",
                    invitation.id
                );
                self.executor
                    .audit()
                    .record(AuditEvent::new(
                        "system",
                        actions::INVITE_EXPIRED,
                        "invitation",
                        &invitation.id,
                    ))
                    .await;
                PortalError::InviteExpired
            }
            // lost to a concurrent transition
            Ok(None) => self.status_after_lost_expiry(&invitation.id).await,
            Err(e) => {
                log::warn!(
                    target: "leasehold",
                    "msg=\"failed to mark invitation expired\", invitation_id={}, error=\"{e}\"",
                    invitation.id
                );
                PortalError::InviteExpired
            }
        }
    }

    async fn status_after_lost_expiry(&self, invite_id: &str) -> PortalError {
        let current = self
            .executor
            .execute("invitations.find_by_id", || self.repo.find_by_id(invite_id))
            .await;

        match current {
            Ok(Some(invitation)) if invitation.status == InvitationStatus::Used => {
                log::debug!(
                    target: "leasehold",
                    "msg=\"invitation redeemed before it could be expired\", invitation_id={invite_id}"
                );
                PortalError::InviteAlreadyUsed
            }
            Ok(_) => PortalError::InviteExpired,
            Err(e) => {
                log::warn!(
                    target: "leasehold",
                    "msg=\"failed to re-read invitation after expiry\", invitation_id={invite_id}, error=\"{e}\""
                );
                PortalError::InviteExpired
            }
        }
    }

    async fn deny(&self, actor: &Actor, input: &GenerateInvitation, reason: &str) -> PortalError {
        log::warn!(
            target: "leasehold",
            "msg=\"invitation denied\", actor={}, role={}, property_id={}, reason=\"{reason}\"",
            actor.uid,
            input.role,
            input.property_id
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new(&actor.uid, actions::INVITE_DENIED, "property", &input.property_id)
                    .with_severity(Severity::Warning)
                    .with_metadata(json!({
                        "requested_role": input.role.as_str(),
                        "actor_role": actor.role.as_str(),
                        "ghost_session": actor.ghost_session,
                        "reason": reason,
                    })),
            )
            .await;

        PortalError::PermissionDenied(reason.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::audit::{AuditTrail, MemoryAuditSink};
    use crate::clock::ManualClock;
    use crate::repository::{MockInvitationRepository, StoreError};
    use crate::resilience::{FixedJitter, RecordingSleeper, RetryPolicy};

    struct Fixture {
        manager: InvitationManager<MockInvitationRepository>,
        repo: MockInvitationRepository,
        clock: ManualClock,
        sink: MemoryAuditSink,
    }

    fn executor(sink: &MemoryAuditSink) -> ResilientExecutor {
        ResilientExecutor::with_sources(
            RetryPolicy::default(),
            RecordingSleeper::new(),
            FixedJitter::default(),
            AuditTrail::new().with_sink(sink.clone()),
        )
    }

    fn setup() -> Fixture {
        let repo = MockInvitationRepository::new();
        let clock = ManualClock::starting_now();
        let sink = MemoryAuditSink::new();
        let manager = InvitationManager::new(
            repo.clone(),
            executor(&sink),
            Arc::new(clock.clone()),
            InvitationConfig::default(),
        );
        Fixture {
            manager,
            repo,
            clock,
            sink,
        }
    }

    fn owner() -> Actor {
        Actor::new("owner-1", UserRole::Owner)
    }

    #[tokio::test]
    async fn test_generate_tenant_invite() {
        let f = setup();

        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", Some("U1")))
            .await
            .unwrap();

        assert_eq!(out.token.expose_secret().len(), 32);
        assert_eq!(out.invitation.id, hash_token(out.token.expose_secret()));
        assert_eq!(out.invitation.status, InvitationStatus::Active);
        assert_eq!(out.invitation.expires_at - out.invitation.created_at, Duration::days(7));
        assert_eq!(out.invitation.created_by, "owner-1");
        assert!(out
            .link
            .expose_secret()
            .ends_with(&format!("/tenant/signup?invite={}&role=tenant", out.token.expose_secret())));

        let stored = f.repo.get(&out.invitation.id).unwrap();
        assert_eq!(stored, out.invitation);
        assert_eq!(f.sink.with_action(actions::INVITE_CREATED).len(), 1);
    }

    #[tokio::test]
    async fn test_raw_token_never_stored() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        let stored = serde_json::to_string(&f.repo.get(&out.invitation.id).unwrap()).unwrap();
        assert!(!stored.contains(out.token.expose_secret()));
    }

    #[tokio::test]
    async fn test_generate_permissions() {
        let f = setup();

        let pmc = Actor::new("pmc-1", UserRole::Pmc);
        let tenant = Actor::new("tenant-1", UserRole::Tenant);
        let admin = Actor::new("admin-1", UserRole::Admin);

        assert!(f
            .manager
            .generate(&pmc, GenerateInvitation::tenant("P1", None))
            .await
            .is_ok());
        assert!(f.manager.generate(&admin, GenerateInvitation::pmc("P1")).await.is_ok());

        assert!(matches!(
            f.manager.generate(&pmc, GenerateInvitation::pmc("P1")).await,
            Err(PortalError::PermissionDenied(_))
        ));
        assert!(matches!(
            f.manager
                .generate(&tenant, GenerateInvitation::tenant("P1", None))
                .await,
            Err(PortalError::PermissionDenied(_))
        ));

        let denied = f.sink.with_action(actions::INVITE_DENIED);
        assert_eq!(denied.len(), 2);
        assert_eq!(denied[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_ghost_session_denied() {
        let f = setup();
        let actor = Actor::new("admin-1", UserRole::Admin).impersonating();

        let result = f
            .manager
            .generate(&actor, GenerateInvitation::tenant("P1", None))
            .await;

        assert!(matches!(result, Err(PortalError::PermissionDenied(_))));
        assert!(f.repo.invitations.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_normalizes_target_email() {
        let f = setup();
        let out = f
            .manager
            .generate(
                &owner(),
                GenerateInvitation::tenant("P1", None).for_email(" Rosa@Example.com "),
            )
            .await
            .unwrap();
        assert_eq!(out.invitation.target_email.as_deref(), Some("rosa@example.com"));

        let bad = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None).for_email("nope"))
            .await;
        assert!(matches!(bad, Err(PortalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_generate_retries_transient_write_failure() {
        let f = setup();
        f.repo
            .faults
            .fail_next("invitations.create", StoreError::unavailable("flaky"));

        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        assert!(f.repo.get(&out.invitation.id).is_some());
        assert_eq!(f.repo.faults.calls("invitations.create"), 2);
    }

    #[tokio::test]
    async fn test_validate_outcomes() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        let found = f.manager.validate(&out.token).await.unwrap();
        assert_eq!(found.id, out.invitation.id);

        assert_eq!(
            f.manager.validate(&SecretString::new("unknown")).await.unwrap_err(),
            PortalError::InviteNotFound
        );
        assert_eq!(
            f.manager.validate(&SecretString::new("")).await.unwrap_err(),
            PortalError::InviteNotFound
        );

        f.manager.consume(&out.invitation.id, "uid-1").await.unwrap();
        assert_eq!(
            f.manager.validate(&out.token).await.unwrap_err(),
            PortalError::InviteAlreadyUsed
        );
    }

    #[tokio::test]
    async fn test_validate_expiry_is_idempotent() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        f.clock.advance(Duration::days(7));

        for _ in 0..3 {
            assert_eq!(
                f.manager.validate(&out.token).await.unwrap_err(),
                PortalError::InviteExpired
            );
            assert_eq!(
                f.repo.get(&out.invitation.id).unwrap().status,
                InvitationStatus::Expired
            );
        }

        assert_eq!(f.sink.with_action(actions::INVITE_EXPIRED).len(), 1);
    }

    #[tokio::test]
    async fn test_consume_concurrently_single_winner() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();
        let id = out.invitation.id.as_str();

        let (a, b) = tokio::join!(f.manager.consume(id, "uid-a"), f.manager.consume(id, "uid-b"));

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!([&a, &b]
            .iter()
            .any(|r| matches!(r, Err(PortalError::InviteConflict))));

        let stored = f.repo.get(id).unwrap();
        assert_eq!(stored.status, InvitationStatus::Used);
        assert!(stored.used_at.is_some());
    }

    #[tokio::test]
    async fn test_consume_is_idempotent_for_same_redeemer() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        f.manager.consume(&out.invitation.id, "uid-a").await.unwrap();
        let again = f.manager.consume(&out.invitation.id, "uid-a").await.unwrap();
        assert_eq!(again.used_by.as_deref(), Some("uid-a"));
    }

    #[tokio::test]
    async fn test_consume_missing_invitation() {
        let f = setup();
        assert_eq!(
            f.manager.consume("missing", "uid-a").await.unwrap_err(),
            PortalError::InviteNotFound
        );
    }

    #[tokio::test]
    async fn test_revert() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();
        let id = out.invitation.id.as_str();

        // reverting an active invitation is a no-op
        f.manager.revert(id).await.unwrap();
        assert_eq!(f.repo.get(id).unwrap(), out.invitation);

        f.manager.consume(id, "uid-a").await.unwrap();
        f.manager.revert(id).await.unwrap();
        f.manager.revert(id).await.unwrap();

        let stored = f.repo.get(id).unwrap();
        assert_eq!(stored.status, InvitationStatus::Active);
        assert_eq!(stored.used_at, None);
        assert_eq!(stored.used_by, None);
        assert_eq!(f.sink.with_action(actions::INVITE_REVERTED).len(), 1);

        // redeemable again
        assert!(f.manager.validate(&out.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_active_and_sweep() {
        let f = setup();
        let first = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", Some("U1")))
            .await
            .unwrap();

        f.clock.advance(Duration::days(3));
        let second = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", Some("U2")))
            .await
            .unwrap();
        f.manager
            .generate(&owner(), GenerateInvitation::tenant("P2", None))
            .await
            .unwrap();

        let active = f.manager.list_active("P1").await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, second.invitation.id);

        f.clock.advance(Duration::days(5));
        let active = f.manager.list_active("P1").await.unwrap();
        assert_eq!(active.len(), 1);

        assert_eq!(f.manager.sweep_expired().await.unwrap(), 1);
        assert_eq!(
            f.repo.get(&first.invitation.id).unwrap().status,
            InvitationStatus::Expired
        );
        assert_eq!(f.manager.sweep_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_revert_redemption_only_undoes_own_redemption() {
        let f = setup();
        let out = f
            .manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();
        let id = out.invitation.id.as_str();

        f.manager.consume(id, "uid-a").await.unwrap();
        f.manager.revert_redemption(id, "uid-b").await.unwrap();

        let stored = f.repo.get(id).unwrap();
        assert_eq!(stored.status, InvitationStatus::Used);
        assert_eq!(stored.used_by.as_deref(), Some("uid-a"));
        assert!(f.sink.with_action(actions::INVITE_REVERTED).is_empty());

        f.manager.revert_redemption(id, "uid-a").await.unwrap();
        assert_eq!(f.repo.get(id).unwrap().status, InvitationStatus::Active);
    }

    #[tokio::test]
    async fn test_generate_rejects_unusable_expiry() {
        let repo = MockInvitationRepository::new();
        let sink = MemoryAuditSink::new();
        let manager = InvitationManager::new(
            repo.clone(),
            executor(&sink),
            Arc::new(ManualClock::starting_now()),
            InvitationConfig {
                expiry_days: i64::MAX,
                ..InvitationConfig::default()
            },
        );

        let err = manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PortalError::Config(ConfigError::InvalidExpiryDays(i64::MAX))
        );
        assert!(repo.invitations.read().unwrap().is_empty());
    }

    /// Redeems the invitation just before an expiry write lands.
    #[derive(Clone)]
    struct RedeemedDuringExpiry {
        inner: MockInvitationRepository,
        redeemer: &'static str,
    }

    #[async_trait]
    impl InvitationRepository for RedeemedDuringExpiry {
        async fn create(&self, invitation: &Invitation) -> Result<(), StoreError> {
            self.inner.create(invitation).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_active_by_property(
            &self,
            property_id: &str,
        ) -> Result<Vec<Invitation>, StoreError> {
            self.inner.find_active_by_property(property_id).await
        }

        async fn find_active_expired(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<Invitation>, StoreError> {
            self.inner.find_active_expired(now).await
        }

        async fn update_if_status(
            &self,
            id: &str,
            expected: InvitationStatus,
            redeemed_by: Option<&str>,
            patch: InvitationPatch,
        ) -> Result<Option<Invitation>, StoreError> {
            if patch.status == InvitationStatus::Expired {
                self.inner
                    .update_if_status(
                        id,
                        InvitationStatus::Active,
                        None,
                        InvitationPatch::redeem(self.redeemer, Utc::now()),
                    )
                    .await?;
            }
            self.inner
                .update_if_status(id, expected, redeemed_by, patch)
                .await
        }
    }

    #[tokio::test]
    async fn test_validate_reports_redemption_that_beat_expiry() {
        let repo = RedeemedDuringExpiry {
            inner: MockInvitationRepository::new(),
            redeemer: "uid-late",
        };
        let clock = ManualClock::starting_now();
        let sink = MemoryAuditSink::new();
        let manager = InvitationManager::new(
            repo.clone(),
            executor(&sink),
            Arc::new(clock.clone()),
            InvitationConfig::default(),
        );
        let out = manager
            .generate(&owner(), GenerateInvitation::tenant("P1", None))
            .await
            .unwrap();

        clock.advance(Duration::days(7));
        assert_eq!(
            manager.validate(&out.token).await.unwrap_err(),
            PortalError::InviteAlreadyUsed
        );

        let stored = repo.inner.get(&out.invitation.id).unwrap();
        assert_eq!(stored.status, InvitationStatus::Used);
        assert_eq!(stored.used_by.as_deref(), Some("uid-late"));
        assert!(sink.with_action(actions::INVITE_EXPIRED).is_empty());
    }
}
