use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::StoreError;

/// A rentable unit inside a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub label: String,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_email: Option<String>,
}

impl Unit {
    pub fn vacant(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tenant_id: None,
            tenant_name: None,
            tenant_email: None,
        }
    }
}

/// The membership portion of a property document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMembership {
    pub owner_ids: Vec<String>,
    pub manager_ids: Vec<String>,
    pub tenant_ids: Vec<String>,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub membership: PropertyMembership,
    /// Bumped by every membership write.
    pub version: u64,
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, StoreError>;

    /// Replaces the membership fields only if the stored version equals
    /// `expected_version`. Returns the updated property, or `None` when the
    /// version moved on or the property is gone.
    async fn update_membership_if_version(
        &self,
        id: &str,
        expected_version: u64,
        membership: &PropertyMembership,
    ) -> Result<Option<Property>, StoreError>;
}
