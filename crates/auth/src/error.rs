use thiserror::Error;

use crate::Permission;

/// Static RBAC configuration defect, detected at startup.
///
/// These are never produced while serving requests; a process that sees one
/// should refuse to start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RbacConfigError {
    #[error("permission '{0}' is declared more than once in the catalog")]
    DuplicatePermission(String),

    #[error("catalog entry '{name}' does not match permission '{permission}'")]
    PermissionNameMismatch { permission: Permission, name: String },

    #[error("permission '{0}' has no catalog entry")]
    UncataloguedPermission(Permission),

    #[error("role '{0}' is declared more than once in the role table")]
    DuplicateRole(String),

    #[error("role name must not be empty")]
    EmptyRoleName,
}
