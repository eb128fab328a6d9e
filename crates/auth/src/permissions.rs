//! Permission catalog.
//!
//! The set of permissions is closed: every permission the system knows about
//! is a variant of [`Permission`] and has exactly one entry in [`CATALOG`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RbacConfigError;

/// Named capability on the `user` service.
///
/// Generic permissions (`get_user`, `update_user`, ...) act on any record in
/// the caller's tenant. Self-scoped permissions (`*_self`) only ever grant
/// through the ownership check in [`crate::authorize`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    GetUserSelf,
    GetUser,
    GetUsers,
    CreateUser,
    UpdateUser,
    UpdateUserSelf,
    DeleteUser,
    DeleteUserSelf,
}

impl Permission {
    /// Every variant, in catalog order.
    pub const ALL: [Permission; 8] = [
        Permission::GetUserSelf,
        Permission::GetUser,
        Permission::GetUsers,
        Permission::CreateUser,
        Permission::UpdateUser,
        Permission::UpdateUserSelf,
        Permission::DeleteUser,
        Permission::DeleteUserSelf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::GetUserSelf => "get_user_self",
            Permission::GetUser => "get_user",
            Permission::GetUsers => "get_users",
            Permission::CreateUser => "create_user",
            Permission::UpdateUser => "update_user",
            Permission::UpdateUserSelf => "update_user_self",
            Permission::DeleteUser => "delete_user",
            Permission::DeleteUserSelf => "delete_user_self",
        }
    }

    /// Whether this permission only applies to the caller's own record.
    pub fn is_self_scoped(&self) -> bool {
        matches!(
            self,
            Permission::GetUserSelf | Permission::UpdateUserSelf | Permission::DeleteUserSelf
        )
    }

    /// The permission that grants the same action on the caller's own record.
    ///
    /// Self-scoped permissions map to themselves; actions with no
    /// self-service form (`get_users`, `create_user`) map to `None`.
    pub fn self_variant(&self) -> Option<Permission> {
        match self {
            Permission::GetUser | Permission::GetUserSelf => Some(Permission::GetUserSelf),
            Permission::UpdateUser | Permission::UpdateUserSelf => Some(Permission::UpdateUserSelf),
            Permission::DeleteUser | Permission::DeleteUserSelf => Some(Permission::DeleteUserSelf),
            Permission::GetUsers | Permission::CreateUser => None,
        }
    }

    /// Catalog entry for this permission.
    pub fn definition(&self) -> &'static PermissionDefinition {
        // CATALOG is ordered like `Permission::ALL`; checked by `validate_catalog`.
        &CATALOG[*self as usize]
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl core::str::FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Catalog entry (for validation/display; grants nothing by itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub permission: Permission,
    pub name: &'static str,
    pub service: &'static str,
    pub description: &'static str,
}

const USER_SERVICE: &str = "user";

const fn entry(permission: Permission, name: &'static str, description: &'static str) -> PermissionDefinition {
    PermissionDefinition {
        permission,
        name,
        service: USER_SERVICE,
        description,
    }
}

/// The full permission catalog, in declaration order.
pub static CATALOG: [PermissionDefinition; 8] = [
    entry(Permission::GetUserSelf, "get_user_self", "Fetch own user details"),
    entry(Permission::GetUser, "get_user", "Fetch individual user details"),
    entry(Permission::GetUsers, "get_users", "Fetch all users in the tenant"),
    entry(Permission::CreateUser, "create_user", "Create a user with any values"),
    entry(Permission::UpdateUser, "update_user", "Update any user's details"),
    entry(Permission::UpdateUserSelf, "update_user_self", "Update own user details"),
    entry(Permission::DeleteUser, "delete_user", "Delete any user"),
    entry(Permission::DeleteUserSelf, "delete_user_self", "Delete own user"),
];

/// Ordered view of every permission the system defines.
pub fn list_permissions() -> &'static [PermissionDefinition] {
    &CATALOG
}

/// Startup check: names are unique and every variant has its own entry.
pub fn validate_catalog(catalog: &[PermissionDefinition]) -> Result<(), RbacConfigError> {
    let mut seen = HashSet::new();
    for def in catalog {
        if !seen.insert(def.name) {
            return Err(RbacConfigError::DuplicatePermission(def.name.to_string()));
        }
        if def.name != def.permission.as_str() {
            return Err(RbacConfigError::PermissionNameMismatch {
                permission: def.permission,
                name: def.name.to_string(),
            });
        }
    }

    for (idx, permission) in Permission::ALL.iter().enumerate() {
        match catalog.get(idx) {
            Some(def) if def.permission == *permission => {}
            _ => return Err(RbacConfigError::UncataloguedPermission(*permission)),
        }
    }

    Ok(())
}
