#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::fault_mock::FaultPlan;
use super::profile::{ProfileRepository, UserProfile};
use super::StoreError;

#[derive(Clone, Default)]
pub struct MockProfileRepository {
    pub profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
    pub faults: FaultPlan,
}

impl MockProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(uid).cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileRepository for MockProfileRepository {
    async fn create(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.faults.check("profiles.create")?;

        let mut profiles = self.profiles.lock().unwrap();
        if profiles.contains_key(&profile.id) {
            return Err(StoreError::already_exists(format!(
                "profile {} already exists",
                profile.id
            )));
        }
        profiles.insert(profile.id.clone(), profile.clone());
        drop(profiles);

        Ok(())
    }

    async fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.faults.check("profiles.find_by_id")?;
        Ok(self.get(uid))
    }

    async fn delete(&self, uid: &str) -> Result<(), StoreError> {
        self.faults.check("profiles.delete")?;
        self.profiles.lock().unwrap().remove(uid);
        Ok(())
    }
}
