use crate::membership::{has_unit, is_linked, project, MembershipDelta};
use crate::repository::{PropertyRepository, StoreError};
use crate::resilience::ResilientExecutor;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipLinkError {
    #[error("property {0} not found")]
    PropertyNotFound(String),
    #[error("unit {unit_id} not found on property {property_id}")]
    UnitNotFound {
        property_id: String,
        unit_id: String,
    },
    #[error("property {property_id} kept changing, gave up after {attempts} writes")]
    VersionConflict { property_id: String, attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked { property_id: String, version: u64 },
    /// The property already listed the account. Nothing was written.
    AlreadyLinked { property_id: String },
    /// The profile has no property to link to.
    NoProperty,
}

/// Writes membership deltas into properties with optimistic versioning.
///
/// Each attempt reads the property, projects the delta and writes it back
/// only if the version is unchanged. A version that moved on means another
/// writer got there first, so the property is read again.
pub struct MembershipLinker<R: PropertyRepository> {
    properties: R,
    executor: ResilientExecutor,
    attempts: u32,
}

impl<R: PropertyRepository> MembershipLinker<R> {
    pub fn new(properties: R, executor: ResilientExecutor, attempts: u32) -> Self {
        Self {
            properties,
            executor,
            attempts: attempts.max(1),
        }
    }

    pub fn repository(&self) -> &R {
        &self.properties
    }

    pub async fn link(
        &self,
        property_id: &str,
        delta: &MembershipDelta,
    ) -> Result<LinkOutcome, MembershipLinkError> {
        for attempt in 1..=self.attempts {
            let property = self
                .executor
                .execute("properties.find_by_id", || {
                    self.properties.find_by_id(property_id)
                })
                .await?
                .ok_or_else(|| MembershipLinkError::PropertyNotFound(property_id.to_owned()))?;

            if let Some(unit_id) = &delta.unit_id {
                if !has_unit(&property.membership, unit_id) {
                    return Err(MembershipLinkError::UnitNotFound {
                        property_id: property_id.to_owned(),
                        unit_id: unit_id.clone(),
                    });
                }
            }

            if is_linked(&property.membership, delta) {
                return Ok(LinkOutcome::AlreadyLinked {
                    property_id: property_id.to_owned(),
                });
            }

            let next = project(&property.membership, delta);
            let written = self
                .executor
                .execute("properties.update_membership", || {
                    self.properties
                        .update_membership_if_version(property_id, property.version, &next)
                })
                .await?;

            if let Some(updated) = written {
                log::info!(
                    target: "leasehold",
                    "msg=\"membership linked\", property_id={property_id}, uid={}, role={}, version={}",
                    delta.uid,
                    delta.role,
                    updated.version
                );
                return Ok(LinkOutcome::Linked {
                    property_id: property_id.to_owned(),
                    version: updated.version,
                });
            }

            log::debug!(
                target: "leasehold",
                "msg=\"property version moved, re-reading\", property_id={property_id}, expected_version={}, attempt={attempt}",
                property.version
            );
        }

        Err(MembershipLinkError::VersionConflict {
            property_id: property_id.to_owned(),
            attempts: self.attempts,
        })
    }
}
