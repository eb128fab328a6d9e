//! HTTP application wiring (axum router + service construction).
//!
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use gatehouse_auth::{AuthorizationEngine, Hs256TokenCodec, TokenCodec};
use gatehouse_infra::{Argon2PasswordHasher, InMemoryUserRepository, PostgresUserRepository};
use gatehouse_users::{NewUserRequest, UserRepository, UserService, UserServiceConfig};

use crate::config::ApiConfig;
use crate::context::AppServices;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
///
/// Fails if the static RBAC tables are inconsistent, the database is
/// unreachable, or the bootstrap account cannot be created.
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    gatehouse_auth::validate_static_config().context("invalid RBAC configuration")?;

    let repo: Arc<dyn UserRepository> = match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres user store");
            Arc::new(
                PostgresUserRepository::connect(url)
                    .await
                    .context("failed to initialize postgres user store")?,
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            InMemoryUserRepository::shared()
        }
    };

    let tokens: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(&config.jwt_secret, config.token_ttl));
    let users = UserService::new(
        repo,
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
        AuthorizationEngine::default(),
        UserServiceConfig {
            min_password_length: config.min_password_length,
        },
    );

    if let Some(seed) = &config.bootstrap_admin {
        let admin = users
            .bootstrap_admin(
                seed.tenant_id,
                NewUserRequest {
                    first_name: "Platform".to_string(),
                    last_name: "Admin".to_string(),
                    email: seed.email.clone(),
                    password: seed.password.clone(),
                    role: None,
                },
            )
            .await
            .context("failed to bootstrap admin account")?;
        tracing::info!(user_id = %admin.id, tenant = %admin.tenant_id, "bootstrap admin ready");
    }

    Ok(router(AppServices::new(users), tokens))
}

/// Assemble routes around already-built services.
pub fn router(services: Arc<AppServices>, tokens: Arc<dyn TokenCodec>) -> Router {
    let auth_state = middleware::AuthState { tokens };

    let user_service = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/user-service", user_service)
        .layer(ServiceBuilder::new())
}
