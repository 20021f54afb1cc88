#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::fault_mock::FaultPlan;
use super::property::{Property, PropertyMembership, PropertyRepository};
use super::StoreError;

#[derive(Clone, Default)]
pub struct MockPropertyRepository {
    pub properties: Arc<Mutex<HashMap<String, Property>>>,
    pub faults: FaultPlan,
}

impl MockPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, property: Property) {
        self.properties
            .lock()
            .unwrap()
            .insert(property.id.clone(), property);
    }

    pub fn get(&self, id: &str) -> Option<Property> {
        self.properties.lock().unwrap().get(id).cloned()
    }

    /// Bumps a property's version as if another writer got there first.
    pub fn touch(&self, id: &str) {
        if let Some(property) = self.properties.lock().unwrap().get_mut(id) {
            property.version += 1;
        }
    }
}

#[async_trait]
impl PropertyRepository for MockPropertyRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, StoreError> {
        self.faults.check("properties.find_by_id")?;
        Ok(self.get(id))
    }

    async fn update_membership_if_version(
        &self,
        id: &str,
        expected_version: u64,
        membership: &PropertyMembership,
    ) -> Result<Option<Property>, StoreError> {
        self.faults.check("properties.update_membership")?;

        let mut properties = self.properties.lock().unwrap();
        let Some(property) = properties.get_mut(id) else {
            return Ok(None);
        };

        if property.version != expected_version {
            return Ok(None);
        }

        property.membership = membership.clone();
        property.version += 1;

        Ok(Some(property.clone()))
    }
}
