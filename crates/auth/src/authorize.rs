use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use gatehouse_core::UserId;

use crate::claims::{IdentityClaims, TokenValidationError, validate_claims};
use crate::{Permission, Role, RolePermissionMap};

/// Why a caller counts as unauthenticated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Unauthenticated {
    #[error("no identity claim presented")]
    MissingClaims,

    #[error(transparent)]
    InvalidClaims(#[from] TokenValidationError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] Unauthenticated),

    #[error("forbidden: requires one of [{}]", join(.required))]
    Forbidden { required: Vec<Permission> },

    /// The claim names a role the map does not know. This is a deployment
    /// defect (role renamed/removed while tokens are live), not a caller error.
    #[error("role '{0}' referenced by claim is not registered")]
    UnknownRole(Role),
}

fn join(permissions: &[Permission]) -> String {
    permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
}

/// What allowed a request through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "permission", rename_all = "snake_case")]
pub enum Grant {
    /// The endpoint only requires a valid identity.
    Authenticated,
    /// The caller's role holds this generic permission.
    Role(Permission),
    /// The caller acts on their own record and holds this self-scoped permission.
    Ownership(Permission),
}

/// Outcome of an authorization request: `Ok` is ALLOW, `Err` is DENY.
pub type Decision = Result<Grant, AuthzError>;

/// Role lookup followed by the ownership fallback.
///
/// - No IO
/// - No panics
/// - No hidden state: identical inputs always produce identical decisions
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    roles: Arc<RolePermissionMap>,
}

impl Default for AuthorizationEngine {
    fn default() -> Self {
        Self::new(RolePermissionMap::builtin())
    }
}

impl AuthorizationEngine {
    pub fn new(roles: Arc<RolePermissionMap>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &RolePermissionMap {
        &self.roles
    }

    /// Decide whether `claims` may perform an action needing any of `required`.
    ///
    /// `target_owner` is the owner of the record being acted on, when there is
    /// one. Call sites normally list only the generic permission; the
    /// self-scoped variant is derived here.
    pub fn authorize(
        &self,
        claims: Option<&IdentityClaims>,
        required: &[Permission],
        target_owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Decision {
        let claims = claims.ok_or(Unauthenticated::MissingClaims)?;
        validate_claims(claims, now).map_err(Unauthenticated::from)?;

        let held = self.roles.permissions_for(&claims.role).map_err(|unknown| {
            tracing::error!(
                role = %unknown.0,
                subject = %claims.sub,
                tenant = %claims.tenant_id,
                "identity claim references a role missing from the role-permission map"
            );
            AuthzError::UnknownRole(unknown.0)
        })?;

        decide(held, claims.sub, required, target_owner)
    }

    /// Same decision as [`Self::authorize`], with enough context to tell a
    /// human why.
    pub fn explain(
        &self,
        claims: Option<&IdentityClaims>,
        required: &[Permission],
        target_owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AuthorizationExplanation {
        let decision = self.authorize(claims, required, target_owner, now);

        let role = claims.map(|c| c.role.clone());
        let effective_permissions = role
            .as_ref()
            .and_then(|r| self.roles.permissions_for(r).ok())
            .cloned()
            .unwrap_or_default();
        let is_owner = match (claims, target_owner) {
            (Some(c), Some(owner)) => Some(c.sub == owner),
            _ => None,
        };

        let (granted, grant, denial, reason) = match decision {
            Ok(grant) => {
                let reason = match grant {
                    Grant::Authenticated => "endpoint requires authentication only".to_string(),
                    Grant::Role(p) => format!("role holds permission '{p}'"),
                    Grant::Ownership(p) => {
                        format!("caller owns the target record and role holds '{p}'")
                    }
                };
                (true, Some(grant), None, reason)
            }
            Err(err) => {
                let kind = match &err {
                    AuthzError::Unauthenticated(_) => DenialKind::Unauthenticated,
                    AuthzError::Forbidden { .. } => DenialKind::Forbidden,
                    AuthzError::UnknownRole(_) => DenialKind::UnknownRole,
                };
                (false, None, Some(kind), err.to_string())
            }
        };

        AuthorizationExplanation {
            required_permissions: required.to_vec(),
            target_owner,
            is_owner,
            granted,
            grant,
            denial,
            reason,
            role,
            effective_permissions,
        }
    }
}

fn decide(
    held: &BTreeSet<Permission>,
    subject: UserId,
    required: &[Permission],
    target_owner: Option<UserId>,
) -> Decision {
    if required.is_empty() {
        return Ok(Grant::Authenticated);
    }

    // Self-scoped permissions never match here; they only grant via ownership.
    if let Some(p) = required
        .iter()
        .find(|p| !p.is_self_scoped() && held.contains(*p))
    {
        return Ok(Grant::Role(*p));
    }

    if target_owner == Some(subject) {
        if let Some(p) = required
            .iter()
            .filter_map(Permission::self_variant)
            .find(|p| held.contains(p))
        {
            return Ok(Grant::Ownership(p));
        }
    }

    tracing::debug!(
        subject = %subject,
        required = %join(required),
        "authorization denied"
    );
    Err(AuthzError::Forbidden {
        required: required.to_vec(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    Forbidden,
    UnknownRole,
}

/// Debuggable account of a single decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permissions: Vec<Permission>,
    pub target_owner: Option<UserId>,
    /// `None` when there is no claim or no target.
    pub is_owner: Option<bool>,
    pub granted: bool,
    pub grant: Option<Grant>,
    pub denial: Option<DenialKind>,
    pub reason: String,
    pub role: Option<Role>,
    pub effective_permissions: BTreeSet<Permission>,
}
