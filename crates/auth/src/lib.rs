//! `gatehouse-auth`: identity claims, the RBAC tables and the authorization
//! decision engine.
//!
//! No HTTP or storage in here.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod permissions;
pub mod roles;
pub mod token;

pub use authorize::{
    AuthorizationEngine, AuthorizationExplanation, AuthzError, Decision, DenialKind, Grant,
    Unauthenticated,
};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use error::RbacConfigError;
pub use permissions::{
    Permission, PermissionDefinition, UnknownPermission, list_permissions, validate_catalog,
};
pub use roles::{
    ROLE_TABLE, Role, RoleDefinition, RolePermissionMap, RoleTable, UnknownRole,
    validate_role_table,
};
pub use token::{Hs256TokenCodec, TokenCodec, TokenError};

/// Check the built-in catalog and role table. Call once before serving.
pub fn validate_static_config() -> Result<(), RbacConfigError> {
    validate_catalog(list_permissions())?;
    validate_role_table(ROLE_TABLE)?;
    Ok(())
}
