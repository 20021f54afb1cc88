#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::fault_mock::FaultPlan;
use super::identity::{Identity, IdentityProvider};
use super::StoreError;
use crate::SecretString;

/// In-memory identity service. Emails are unique, compared case-insensitively.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    pub identities: Arc<Mutex<HashMap<String, Identity>>>,
    pub faults: FaultPlan,
    credentials: Arc<Mutex<HashMap<String, SecretString>>>,
    next_id: Arc<AtomicU64>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<Identity> {
        self.identities.lock().unwrap().get(uid).cloned()
    }

    pub fn find_by_email(&self, email: &str) -> Option<Identity> {
        self.identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Whether `password` is the current credential for `uid`.
    pub fn has_credential(&self, uid: &str, password: &str) -> bool {
        self.credentials
            .lock()
            .unwrap()
            .get(uid)
            .is_some_and(|c| c.expose_secret() == password)
    }

    pub fn len(&self) -> usize {
        self.identities.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, StoreError> {
        self.faults.check("identities.create")?;

        reject_weak(password)?;

        if self.find_by_email(email).is_some() {
            return Err(StoreError::from_provider(
                "auth/email-already-in-use",
                format!("{email} is already registered"),
            ));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = Identity {
            uid: format!("uid-{n}"),
            email: email.to_owned(),
            created_at: Utc::now(),
        };

        self.identities
            .lock()
            .unwrap()
            .insert(identity.uid.clone(), identity.clone());
        self.credentials
            .lock()
            .unwrap()
            .insert(identity.uid.clone(), password.clone());

        Ok(identity)
    }

    async fn delete_identity(&self, uid: &str) -> Result<(), StoreError> {
        self.faults.check("identities.delete")?;
        self.identities.lock().unwrap().remove(uid);
        self.credentials.lock().unwrap().remove(uid);
        Ok(())
    }

    async fn update_credential(
        &self,
        uid: &str,
        password: &SecretString,
    ) -> Result<(), StoreError> {
        self.faults.check("identities.update_credential")?;
        reject_weak(password)?;

        if self.get(uid).is_none() {
            return Err(StoreError::from_provider(
                "auth/user-not-found",
                format!("no identity {uid}"),
            ));
        }

        self.credentials
            .lock()
            .unwrap()
            .insert(uid.to_owned(), password.clone());
        Ok(())
    }

    async fn find_identity(&self, uid: &str) -> Result<Option<Identity>, StoreError> {
        self.faults.check("identities.find")?;
        Ok(self.get(uid))
    }
}

fn reject_weak(password: &SecretString) -> Result<(), StoreError> {
    if password.is_empty() {
        return Err(StoreError::from_provider(
            "auth/weak-password",
            "password must not be empty",
        ));
    }
    Ok(())
}
