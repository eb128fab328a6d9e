//! In-memory user repository for tests and single-process dev runs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gatehouse_core::{Entity, TenantId, UserId};
use gatehouse_users::{RepositoryError, UserRecord, UserRepository};

use crate::read_model::{InMemoryTenantStore, StoreError, TenantStore};

/// `UserRepository` over an [`InMemoryTenantStore`].
///
/// Writes are serialized so the per-tenant email check and the write happen
/// as one step.
pub struct InMemoryUserRepository<S = InMemoryTenantStore<UserId, UserRecord>> {
    store: S,
    writes: Mutex<()>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::with_store(InMemoryTenantStore::new())
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InMemoryUserRepository<S>
where
    S: TenantStore<UserId, UserRecord>,
{
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    fn email_owner(&self, tenant_id: TenantId, email: &str) -> Result<Option<UserId>, RepositoryError> {
        Ok(self
            .store
            .list(tenant_id)
            .map_err(backend)?
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| u.id))
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, RepositoryError> {
        self.writes
            .lock()
            .map_err(|_| RepositoryError::Backend("user store lock poisoned".to_string()))
    }
}

#[async_trait]
impl<S> UserRepository for InMemoryUserRepository<S>
where
    S: TenantStore<UserId, UserRecord>,
{
    async fn insert(&self, user: UserRecord) -> Result<(), RepositoryError> {
        let _guard = self.lock_writes()?;
        let (tenant_id, id) = (user.tenant_id(), *user.id());

        if self.email_owner(tenant_id, &user.email)?.is_some() {
            return Err(RepositoryError::Conflict(format!("email {} already registered", user.email)));
        }
        if self.store.get(tenant_id, &id).map_err(backend)?.is_some() {
            return Err(RepositoryError::Conflict(format!("user {id} already exists")));
        }

        self.store.upsert(tenant_id, id, user).map_err(backend)
    }

    async fn get(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        self.store.get(tenant_id, &user_id).map_err(backend)
    }

    async fn find_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self
            .store
            .list(tenant_id)
            .map_err(backend)?
            .into_iter()
            .find(|u| u.email == email))
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<UserRecord>, RepositoryError> {
        self.store.list(tenant_id).map_err(backend)
    }

    async fn update(&self, user: UserRecord) -> Result<bool, RepositoryError> {
        let _guard = self.lock_writes()?;
        let (tenant_id, id) = (user.tenant_id(), *user.id());

        if self.store.get(tenant_id, &id).map_err(backend)?.is_none() {
            return Ok(false);
        }
        match self.email_owner(tenant_id, &user.email)? {
            Some(owner) if owner != id => {
                return Err(RepositoryError::Conflict(format!("email {} already registered", user.email)));
            }
            _ => {}
        }

        self.store.upsert(tenant_id, id, user).map_err(backend)?;
        Ok(true)
    }

    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, RepositoryError> {
        let _guard = self.lock_writes()?;
        Ok(self.store.remove(tenant_id, &user_id).map_err(backend)?.is_some())
    }
}

fn backend(e: StoreError) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}
