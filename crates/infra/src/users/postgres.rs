//! Postgres-backed user repository.
//!
//! ## Tenant Isolation
//!
//! Every statement carries `tenant_id` in its WHERE clause or primary key.
//! Email uniqueness is a `(tenant_id, email)` unique index.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_auth::Role;
use gatehouse_core::{TenantId, UserId};
use gatehouse_users::{RepositoryError, UserRecord, UserRepository};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    tenant_id     UUID        NOT NULL,
    user_id       UUID        NOT NULL,
    first_name    TEXT        NOT NULL,
    last_name     TEXT        NOT NULL,
    email         TEXT        NOT NULL,
    password_hash TEXT        NOT NULL,
    role          TEXT        NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (tenant_id, user_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS users_tenant_email_idx ON users (tenant_id, email);
"#;

const COLUMNS: &str =
    "tenant_id, user_id, first_name, last_name, email, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Idempotent schema bootstrap.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("users schema ready");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(tenant_id = %user.tenant_id, user_id = %user.id), err)]
    async fn insert(&self, user: UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(&format!(
            "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(user.tenant_id.as_uuid())
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    async fn get(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 AND user_id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self, email), fields(tenant_id = %tenant_id), err)]
    async fn find_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 AND email = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<UserRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY created_at ASC, user_id ASC"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(tenant_id = %user.tenant_id, user_id = %user.id), err)]
    async fn update(&self, user: UserRecord) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $3, last_name = $4, email = $5, password_hash = $6,
                role = $7, updated_at = $8
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(user.tenant_id.as_uuid())
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRecord, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Backend(format!("failed to decode user row: {e}"));

    let tenant_id: uuid::Uuid = row.try_get("tenant_id").map_err(decode)?;
    let user_id: uuid::Uuid = row.try_get("user_id").map_err(decode)?;
    let role: String = row.try_get("role").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(UserRecord {
        id: UserId::from_uuid(user_id),
        tenant_id: TenantId::from_uuid(tenant_id),
        first_name: row.try_get("first_name").map_err(decode)?,
        last_name: row.try_get("last_name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role: Role::new(role),
        created_at,
        updated_at,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            if db_err.is_unique_violation() {
                RepositoryError::Conflict(msg)
            } else {
                RepositoryError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::Backend(format!("connection pool closed in {operation}"))
        }
        other => RepositoryError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
