//! Storage and hashing ports.

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::{TenantId, UserId};

use crate::model::UserRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A uniqueness constraint (tenant + email) was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Tenant-isolated user storage.
///
/// Every lookup is scoped by tenant: a record in another tenant is simply
/// not there.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the email is taken in
    /// the record's tenant.
    async fn insert(&self, user: UserRecord) -> Result<(), RepositoryError>;

    async fn get(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError>;

    /// Lookup by already-normalized email.
    async fn find_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<UserRecord>, RepositoryError>;

    /// Replace an existing record. Returns `false` if it does not exist.
    async fn update(&self, user: UserRecord) -> Result<bool, RepositoryError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashingError(pub String);

pub trait PasswordHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, HashingError>;

    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unusable.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, HashingError>;
}
