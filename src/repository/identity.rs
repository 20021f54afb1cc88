use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::SecretString;

/// An authentication principal owned by the external identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a principal with an email/password credential.
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, StoreError>;

    /// Deletes a principal. Deleting an unknown uid is not an error.
    async fn delete_identity(&self, uid: &str) -> Result<(), StoreError>;

    /// Replaces the password credential of an existing principal.
    ///
    /// Fails with `not-found` for an unknown uid and `invalid-argument` when
    /// the identity service rejects the password.
    async fn update_credential(&self, uid: &str, password: &SecretString)
    -> Result<(), StoreError>;

    async fn find_identity(&self, uid: &str) -> Result<Option<Identity>, StoreError>;
}
