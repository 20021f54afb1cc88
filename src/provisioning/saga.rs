use std::sync::Arc;

use serde_json::json;

use super::link::{LinkOutcome, MembershipLinkError, MembershipLinker};
use super::stage::{SagaRun, SagaStage};
use super::types::{SignupOutcome, SignupRequest, SignupWarning};
use crate::audit::{actions, AuditEvent, Severity};
use crate::clock::Clock;
use crate::config::ProvisioningConfig;
use crate::invitations::InvitationManager;
use crate::membership::MembershipDelta;
use crate::repository::{
    Identity, IdentityProvider, Invitation, InvitationRepository, OnboardingFlags, Preferences,
    ProfileRepository, PropertyRepository, StoreErrorCode, UserProfile,
};
use crate::resilience::ResilientExecutor;
use crate::validators::{normalize_email, validate_email, validate_name};
use crate::{PortalError, UserRole};

/// Provisions portal accounts as a sequence of compensable stages.
///
/// A signup creates the identity first, then validates and redeems the
/// invitation, writes the profile and finally links the account into its
/// property. A failure before membership linking undoes every write the run
/// attempted, in reverse order. Membership linking is never undone: when it
/// fails the signup still succeeds, with a
/// [`SignupWarning::MembershipLinkDegraded`] warning.
///
/// Every stage boundary is written to the audit trail as a
/// `provisioning.checkpoint` event carrying the run id, so a run that died
/// halfway can be found and reconciled later.
pub struct ProvisioningSaga<I, P, R, V>
where
    I: IdentityProvider,
    P: ProfileRepository,
    R: PropertyRepository,
    V: InvitationRepository,
{
    identities: I,
    profiles: P,
    invitations: InvitationManager<V>,
    linker: MembershipLinker<R>,
    executor: ResilientExecutor,
    clock: Arc<dyn Clock>,
    config: ProvisioningConfig,
}

impl<I, P, R, V> ProvisioningSaga<I, P, R, V>
where
    I: IdentityProvider,
    P: ProfileRepository,
    R: PropertyRepository,
    V: InvitationRepository,
{
    pub fn new(
        identities: I,
        profiles: P,
        properties: R,
        invitations: InvitationManager<V>,
        executor: ResilientExecutor,
        clock: Arc<dyn Clock>,
        config: ProvisioningConfig,
    ) -> Self {
        let linker = MembershipLinker::new(
            properties,
            executor.clone(),
            config.membership_write_attempts,
        );
        Self {
            identities,
            profiles,
            invitations,
            linker,
            executor,
            clock,
            config,
        }
    }

    pub fn invitations(&self) -> &InvitationManager<V> {
        &self.invitations
    }

    /// Runs a signup to completion or fully compensates it.
    ///
    /// # Returns
    ///
    /// - `Ok(outcome)` - identity and profile exist; check
    ///   `outcome.warnings` for a degraded membership link
    /// - `Err(PortalError::PermissionDenied)` - role needs an invitation,
    ///   admin signup, or the invitation targets another email
    /// - `Err(PortalError::InviteNotFound | InviteExpired | InviteAlreadyUsed)`
    /// - `Err(PortalError::IdentityCreateFailed | ProfileCreateFailed)`
    /// - `Err(PortalError::Validation)` - malformed email, name or password
    /// - `Err(PortalError::Storage)` - storage failed while handling the
    ///   invitation
    ///
    /// On every error no identity, profile or consumed invitation is left
    /// behind, unless a compensation itself failed (reported as a
    /// `provisioning.compensation_failed` audit event).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "provision_account", skip_all, err)
    )]
    pub async fn execute(&self, request: SignupRequest) -> Result<SignupOutcome, PortalError> {
        let mut run = SagaRun::start();

        match self.run(&mut run, &request).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.compensate(&run, &err).await;
                self.report_failure(&run, &request, &err).await;
                Err(err)
            }
        }
    }

    /// Re-runs membership linking alone for an existing profile.
    ///
    /// Safe to call any number of times; an account that is already listed
    /// on its property is left untouched.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "relink_membership", skip_all, err)
    )]
    pub async fn relink_membership(&self, uid: &str) -> Result<LinkOutcome, PortalError> {
        let profile = self
            .executor
            .execute("profiles.find_by_id", || self.profiles.find_by_id(uid))
            .await?
            .ok_or_else(|| PortalError::ProfileNotFound(uid.to_owned()))?;

        let Some((property_id, delta)) = MembershipDelta::for_profile(&profile) else {
            return Ok(LinkOutcome::NoProperty);
        };

        let outcome = self.linker.link(&property_id, &delta).await?;

        if let LinkOutcome::Linked { version, .. } = &outcome {
            self.executor
                .audit()
                .record(
                    AuditEvent::new(uid, actions::MEMBERSHIP_LINKED, "property", &property_id)
                        .with_metadata(json!({
                            "uid": uid,
                            "role": profile.role.as_str(),
                            "unit_id": delta.unit_id,
                            "version": version,
                            "repair": true,
                        })),
                )
                .await;
        }

        Ok(outcome)
    }

    async fn run(
        &self,
        run: &mut SagaRun,
        request: &SignupRequest,
    ) -> Result<SignupOutcome, PortalError> {
        run.enter(SagaStage::PreCheck);
        let email = self.pre_check(request)?;
        self.checkpoint(run, SagaStage::PreCheck).await;

        run.enter(SagaStage::CreateIdentity);
        let identity = self
            .identities
            .create_identity(&email, &request.password)
            .await
            .map_err(PortalError::IdentityCreateFailed)?;
        run.uid = Some(identity.uid.clone());
        self.checkpoint(run, SagaStage::CreateIdentity).await;

        let invitation = match request.invite() {
            Some(token) => {
                run.enter(SagaStage::ValidateInvite);
                let invitation = self.invitations.validate(token).await?;
                if let Some(target) = &invitation.target_email {
                    if *target != email {
                        return Err(PortalError::PermissionDenied(
                            "this invitation was issued to a different email address".to_owned(),
                        ));
                    }
                }
                run.invite_id = Some(invitation.id.clone());
                self.checkpoint(run, SagaStage::ValidateInvite).await;

                run.enter(SagaStage::ConsumeInvite);
                let consumed = self
                    .invitations
                    .consume(&invitation.id, &identity.uid)
                    .await
                    .map_err(|e| match e {
                        PortalError::InviteConflict => PortalError::InviteAlreadyUsed,
                        other => other,
                    })?;
                self.checkpoint(run, SagaStage::ConsumeInvite).await;
                Some(consumed)
            }
            None => None,
        };

        run.enter(SagaStage::PersistProfile);
        let profile = self.build_profile(&identity, request, invitation.as_ref());
        self.persist_profile(&profile).await?;
        self.checkpoint(run, SagaStage::PersistProfile).await;

        let mut warnings = Vec::new();
        if let Some((property_id, delta)) = MembershipDelta::for_profile(&profile) {
            run.enter(SagaStage::LinkMembership);
            if let Err(error) = self.link_membership(&property_id, &delta).await {
                warnings.push(SignupWarning::MembershipLinkDegraded { property_id, error });
            }
            self.checkpoint(run, SagaStage::LinkMembership).await;
        }

        self.complete(run, &profile, &warnings).await;

        Ok(SignupOutcome {
            identity,
            profile,
            warnings,
        })
    }

    /// Rejects malformed input and roles that cannot sign up as requested.
    /// Returns the normalized email.
    fn pre_check(&self, request: &SignupRequest) -> Result<String, PortalError> {
        validate_email(&request.email)?;
        validate_name(&request.name)?;
        self.config.password_policy.validate(&request.password)?;

        if !request.role.allows_signup() {
            return Err(PortalError::PermissionDenied(format!(
                "{} accounts cannot be created by signup",
                request.role
            )));
        }

        if request.role.requires_invite() && request.invite().is_none() {
            return Err(PortalError::PermissionDenied(format!(
                "{} accounts need an invitation",
                request.role
            )));
        }

        Ok(normalize_email(&request.email))
    }

    /// Writes the profile. A retried write that reports `already-exists`
    /// counts as success when the stored profile is this run's own.
    async fn persist_profile(&self, profile: &UserProfile) -> Result<(), PortalError> {
        let err = match self
            .executor
            .execute("profiles.create", || self.profiles.create(profile))
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) if e.code == StoreErrorCode::AlreadyExists => e,
            Err(e) => return Err(PortalError::ProfileCreateFailed(e)),
        };

        let stored = self
            .executor
            .execute("profiles.find_by_id", || self.profiles.find_by_id(&profile.id))
            .await
            .map_err(PortalError::ProfileCreateFailed)?;

        match stored {
            Some(existing)
                if existing.id == profile.id && existing.invite_id == profile.invite_id =>
            {
                log::debug!(
                    target: "leasehold",
                    "msg=\"profile write already applied\", uid={}",
                    profile.id
                );
                Ok(())
            }
            _ => Err(PortalError::ProfileCreateFailed(err)),
        }
    }

    fn build_profile(
        &self,
        identity: &Identity,
        request: &SignupRequest,
        invitation: Option<&Invitation>,
    ) -> UserProfile {
        let role = invitation.map_or(request.role, |i| i.role);
        let linked_unit_id = invitation
            .filter(|i| i.role == UserRole::Tenant)
            .and_then(|i| i.unit_id.clone());

        UserProfile {
            id: identity.uid.clone(),
            name: request.name.trim().to_owned(),
            email: identity.email.clone(),
            role,
            onboarding: OnboardingFlags {
                completed: false,
                profile_confirmed: false,
                property_linked: invitation.is_some(),
            },
            linked_property_id: invitation.map(|i| i.property_id.clone()),
            linked_unit_id,
            invite_id: invitation.map(|i| i.id.clone()),
            preferences: Preferences::default(),
            created_at: self.clock.now(),
        }
    }

    async fn link_membership(
        &self,
        property_id: &str,
        delta: &MembershipDelta,
    ) -> Result<(), MembershipLinkError> {
        match self.linker.link(property_id, delta).await {
            Ok(outcome) => {
                self.executor
                    .audit()
                    .record(
                        AuditEvent::new(&delta.uid, actions::MEMBERSHIP_LINKED, "property", property_id)
                            .with_metadata(json!({
                                "uid": delta.uid,
                                "role": delta.role.as_str(),
                                "unit_id": delta.unit_id,
                                "already_linked": matches!(outcome, LinkOutcome::AlreadyLinked { .. }),
                            })),
                    )
                    .await;
                Ok(())
            }
            Err(error) => {
                log::warn!(
                    target: "leasehold",
                    "msg=\"membership link degraded\", property_id={property_id}, uid={}, error=\"{error}\"",
                    delta.uid
                );
                self.executor
                    .audit()
                    .record(
                        AuditEvent::new(&delta.uid, actions::MEMBERSHIP_DEGRADED, "property", property_id)
                            .with_severity(Severity::Warning)
                            .with_metadata(json!({
                                "uid": delta.uid,
                                "role": delta.role.as_str(),
                                "unit_id": delta.unit_id,
                                "error": error.to_string(),
                            })),
                    )
                    .await;
                Err(error)
            }
        }
    }

    async fn complete(&self, run: &mut SagaRun, profile: &UserProfile, warnings: &[SignupWarning]) {
        run.enter(SagaStage::Complete);

        log::info!(
            target: "leasehold",
            "msg=\"account provisioned\", run_id={}, uid={}, role={}, property_id={}, degraded={}",
            run.run_id,
            profile.id,
            profile.role,
            profile.linked_property_id.as_deref().unwrap_or("-"),
            !warnings.is_empty()
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new(&profile.id, actions::SIGNUP_COMPLETED, "user", &profile.id)
                    .with_metadata(json!({
                        "run_id": run.run_id,
                        "role": profile.role.as_str(),
                        "property_id": profile.linked_property_id,
                        "unit_id": profile.linked_unit_id,
                        "invite_id": profile.invite_id,
                        "warnings": warnings.len(),
                    })),
            )
            .await;
    }

    async fn checkpoint(&self, run: &SagaRun, stage: SagaStage) {
        log::debug!(
            target: "leasehold",
            "msg=\"provisioning checkpoint\", run_id={}, stage={stage}",
            run.run_id
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new(run.actor(), actions::CHECKPOINT, "signup", &run.run_id)
                    .with_metadata(json!({
                        "run_id": run.run_id,
                        "stage": stage.as_str(),
                        "uid": run.uid,
                        "invite_id": run.invite_id,
                    })),
            )
            .await;
    }

    async fn compensate(&self, run: &SagaRun, cause: &PortalError) {
        for stage in run.to_compensate() {
            let (entity_type, entity_id, result) = match stage {
                SagaStage::PersistProfile => {
                    let Some(uid) = run.uid.as_deref() else {
                        continue;
                    };
                    let result = self
                        .executor
                        .execute("profiles.delete", || self.profiles.delete(uid))
                        .await
                        .map_err(PortalError::from);
                    ("profile", uid, result)
                }
                // only undoes a redemption made by this run's identity
                SagaStage::ConsumeInvite => {
                    let (Some(invite_id), Some(uid)) = (run.invite_id.as_deref(), run.uid.as_deref())
                    else {
                        continue;
                    };
                    let result = self.invitations.revert_redemption(invite_id, uid).await;
                    ("invitation", invite_id, result)
                }
                SagaStage::CreateIdentity => {
                    let Some(uid) = run.uid.as_deref() else {
                        continue;
                    };
                    let result = self
                        .executor
                        .execute("identities.delete", || self.identities.delete_identity(uid))
                        .await
                        .map_err(PortalError::from);
                    ("identity", uid, result)
                }
                _ => continue,
            };

            match result {
                Ok(()) => {
                    log::info!(
                        target: "leasehold",
                        "msg=\"stage compensated\", run_id={}, stage={stage}, entity_id={entity_id}",
                        run.run_id
                    );
                    self.executor
                        .audit()
                        .record(
                            AuditEvent::new(run.actor(), actions::COMPENSATED, entity_type, entity_id)
                                .with_severity(Severity::Warning)
                                .with_metadata(json!({
                                    "run_id": run.run_id,
                                    "stage": stage.as_str(),
                                    "cause": cause.category(),
                                })),
                        )
                        .await;
                }
                Err(e) => {
                    log::error!(
                        target: "leasehold",
                        "msg=\"compensation failed\", run_id={}, stage={stage}, entity_id={entity_id}, error=\"{e}\"",
                        run.run_id
                    );
                    self.executor
                        .audit()
                        .record(
                            AuditEvent::new(
                                run.actor(),
                                actions::COMPENSATION_FAILED,
                                entity_type,
                                entity_id,
                            )
                            .with_severity(Severity::Critical)
                            .with_metadata(json!({
                                "run_id": run.run_id,
                                "stage": stage.as_str(),
                                "cause": cause.category(),
                                "error": e.to_string(),
                            })),
                        )
                        .await;
                }
            }
        }
    }

    async fn report_failure(&self, run: &SagaRun, request: &SignupRequest, err: &PortalError) {
        let failed_stage = run.current();

        log::warn!(
            target: "leasehold",
            "msg=\"signup failed\", run_id={}, stage={failed_stage}, role={}, error=\"{err}\"",
            run.run_id,
            request.role
        );

        self.executor
            .audit()
            .record(
                AuditEvent::new(run.actor(), actions::SIGNUP_FAILED, "signup", &run.run_id)
                    .with_severity(Severity::Warning)
                    .with_metadata(json!({
                        "run_id": run.run_id,
                        "stage": failed_stage.as_str(),
                        "category": err.category(),
                        "requested_role": request.role.as_str(),
                        "invited": request.invite().is_some(),
                    })),
            )
            .await;
    }
}
