//! Process configuration from environment variables (and `.env`).

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use gatehouse_core::TenantId;

pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for `TOKEN_TTL_SECS`: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("BOOTSTRAP_ADMIN_* must be set together (missing {0})")]
    IncompleteBootstrap(&'static str),
}

/// Seed account created at startup if it does not exist yet.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub tenant_id: TenantId,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("tenant_id", &self.tenant_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub database_url: Option<String>,
    pub min_password_length: usize,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("min_password_length", &self.min_password_length)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| invalid("BIND_ADDR", e))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let ttl_secs: i64 = match var("TOKEN_TTL_SECS") {
            Some(raw) => raw.parse().map_err(|e| invalid("TOKEN_TTL_SECS", e))?,
            None => 3600,
        };
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(invalid(
                "TOKEN_TTL_SECS",
                format!("must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"),
            ));
        }
        let token_ttl = Duration::try_seconds(ttl_secs)
            .ok_or_else(|| invalid("TOKEN_TTL_SECS", "out of range"))?;

        let min_password_length = match var("MIN_PASSWORD_LENGTH") {
            Some(raw) => raw.parse().map_err(|e| invalid("MIN_PASSWORD_LENGTH", e))?,
            None => 8,
        };

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_TENANT"),
            var("BOOTSTRAP_ADMIN_EMAIL"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (None, None, None) => None,
            (Some(tenant), Some(email), Some(password)) => Some(BootstrapAdmin {
                tenant_id: tenant.parse().map_err(|e| invalid("BOOTSTRAP_ADMIN_TENANT", e))?,
                email,
                password,
            }),
            (None, _, _) => return Err(ConfigError::IncompleteBootstrap("BOOTSTRAP_ADMIN_TENANT")),
            (_, None, _) => return Err(ConfigError::IncompleteBootstrap("BOOTSTRAP_ADMIN_EMAIL")),
            (_, _, None) => return Err(ConfigError::IncompleteBootstrap("BOOTSTRAP_ADMIN_PASSWORD")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            database_url: var("DATABASE_URL"),
            min_password_length,
            bootstrap_admin,
        })
    }

    /// In-memory storage, fixed secret, no seed account.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(3600),
            database_url: None,
            min_password_length: 8,
            bootstrap_admin: None,
        }
    }
}

fn invalid(name: &'static str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, Duration::seconds(3600));
        assert_eq!(cfg.min_password_length, 8);
        assert!(cfg.database_url.is_none());
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let tenant = TenantId::new();
        let cfg = from_pairs(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "60"),
            ("DATABASE_URL", "postgres://localhost/users"),
            ("MIN_PASSWORD_LENGTH", "12"),
            ("BOOTSTRAP_ADMIN_TENANT", &tenant.to_string()),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "change me please"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_ttl, Duration::seconds(60));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/users"));
        assert_eq!(cfg.min_password_length, 12);
        assert_eq!(cfg.bootstrap_admin.unwrap().tenant_id, tenant);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = from_pairs(&[("JWT_SECRET", "  "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(matches!(
            from_pairs(&[("TOKEN_TTL_SECS", "soon")]),
            Err(ConfigError::Invalid { name: "TOKEN_TTL_SECS", .. })
        ));
        assert!(matches!(
            from_pairs(&[("TOKEN_TTL_SECS", "0")]),
            Err(ConfigError::Invalid { name: "TOKEN_TTL_SECS", .. })
        ));
        assert!(matches!(
            from_pairs(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
    }

    #[test]
    fn token_ttl_has_an_upper_bound() {
        for raw in [i64::MAX.to_string(), "9000000000000000".to_string(), (MAX_TOKEN_TTL_SECS + 1).to_string()] {
            assert!(
                matches!(
                    from_pairs(&[("TOKEN_TTL_SECS", &raw)]),
                    Err(ConfigError::Invalid { name: "TOKEN_TTL_SECS", .. })
                ),
                "{raw} should be rejected"
            );
        }

        let cfg = from_pairs(&[("TOKEN_TTL_SECS", &MAX_TOKEN_TTL_SECS.to_string())]).unwrap();
        assert_eq!(cfg.token_ttl, Duration::days(365));
    }

    #[test]
    fn partial_bootstrap_is_an_error() {
        assert_eq!(
            from_pairs(&[("BOOTSTRAP_ADMIN_EMAIL", "root@example.com")]).unwrap_err(),
            ConfigError::IncompleteBootstrap("BOOTSTRAP_ADMIN_TENANT")
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = from_pairs(&[
            ("JWT_SECRET", "super-secret-value"),
            ("DATABASE_URL", "postgres://user:hunter2@db/users"),
        ])
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("hunter2"));
    }
}
