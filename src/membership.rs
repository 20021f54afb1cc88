//! Membership projection.
//!
//! Computes the property membership that results from linking one account.
//! The projection is pure and idempotent: applying the same delta twice
//! gives the same membership as applying it once, which is what makes a
//! failed link safe to retry on its own.

use crate::repository::{PropertyMembership, UserProfile};
use crate::UserRole;

/// One account to link into a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDelta {
    pub uid: String,
    pub role: UserRole,
    pub unit_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl MembershipDelta {
    /// The delta for a profile's linked property, if it has one.
    pub fn for_profile(profile: &UserProfile) -> Option<(String, Self)> {
        let property_id = profile.linked_property_id.clone()?;
        let delta = Self {
            uid: profile.id.clone(),
            role: profile.role,
            unit_id: profile.linked_unit_id.clone(),
            name: Some(profile.name.clone()),
            email: Some(profile.email.clone()),
        };
        Some((property_id, delta))
    }
}

/// Applies `delta` to `current`.
///
/// The uid is added, if absent, to the array matching its role (owners to
/// `owner_ids`, pmc to `manager_ids`, tenants to `tenant_ids`; admins to
/// none). With a unit id, the matching unit's tenant fields are replaced
/// and every other unit is returned unchanged.
pub fn project(current: &PropertyMembership, delta: &MembershipDelta) -> PropertyMembership {
    let mut next = current.clone();

    if let Some(ids) = ids_for_role(&mut next, delta.role) {
        add_if_absent(ids, &delta.uid);
    }

    if let Some(unit_id) = &delta.unit_id {
        if let Some(unit) = next.units.iter_mut().find(|u| &u.id == unit_id) {
            unit.tenant_id = Some(delta.uid.clone());
            unit.tenant_name.clone_from(&delta.name);
            unit.tenant_email.clone_from(&delta.email);
        }
    }

    next
}

/// Whether `membership` already reflects `delta`.
pub fn is_linked(membership: &PropertyMembership, delta: &MembershipDelta) -> bool {
    project(membership, delta) == *membership
}

/// Whether the property has a unit with this id.
pub fn has_unit(membership: &PropertyMembership, unit_id: &str) -> bool {
    membership.units.iter().any(|u| u.id == unit_id)
}

fn ids_for_role(membership: &mut PropertyMembership, role: UserRole) -> Option<&mut Vec<String>> {
    match role {
        UserRole::Owner => Some(&mut membership.owner_ids),
        UserRole::Pmc => Some(&mut membership.manager_ids),
        UserRole::Tenant => Some(&mut membership.tenant_ids),
        UserRole::Admin => None,
    }
}

fn add_if_absent(ids: &mut Vec<String>, uid: &str) {
    if !ids.iter().any(|id| id == uid) {
        ids.push(uid.to_owned());
    }
}
