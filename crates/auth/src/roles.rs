//! Roles and the role → permission map.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Permission;
use crate::error::RbacConfigError;

/// Role identifier carried in identity claims.
///
/// Kept as an opaque string: a claim may name a role this process no longer
/// knows about, and that has to surface as [`UnknownRole`] rather than a
/// decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Full administrative access across the tenant.
    pub const PLATFORM_ADMIN: Role = Role(Cow::Borrowed("platform_admin"));

    /// Standard account: self-service only.
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("role '{0}' is not registered")]
pub struct UnknownRole(pub Role);

/// Literal role definitions: name, description, granted permissions.
pub type RoleTable = [(&'static str, &'static str, &'static [Permission])];

/// Built-in role table. Adding a role is adding a line here.
pub static ROLE_TABLE: &RoleTable = &[
    (
        "platform_admin",
        "Full administrative access to every user record in the tenant",
        &Permission::ALL,
    ),
    (
        "user",
        "Standard account limited to its own record",
        &[
            Permission::GetUserSelf,
            Permission::UpdateUserSelf,
            Permission::DeleteUserSelf,
        ],
    ),
];

/// Role definition (for display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub description: &'static str,
    pub permissions: BTreeSet<Permission>,
}

/// Immutable mapping from role to the permissions it holds.
///
/// Built once at startup and shared through `Arc`; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionMap {
    roles: HashMap<Role, RoleDefinition>,
}

static BUILTIN: LazyLock<Arc<RolePermissionMap>> =
    LazyLock::new(|| Arc::new(RolePermissionMap::from_table(ROLE_TABLE)));

impl RolePermissionMap {
    /// Process-wide map built from [`ROLE_TABLE`].
    pub fn builtin() -> Arc<RolePermissionMap> {
        Arc::clone(&BUILTIN)
    }

    /// Build a map from a literal table.
    ///
    /// Run [`validate_role_table`] on the same table first; a duplicated
    /// name here keeps the last entry.
    pub fn from_table(table: &RoleTable) -> Self {
        let roles = table
            .iter()
            .map(|(name, description, permissions)| {
                let role = Role::new(*name);
                let def = RoleDefinition {
                    name: role.clone(),
                    description: *description,
                    permissions: permissions.iter().copied().collect(),
                };
                (role, def)
            })
            .collect();

        Self { roles }
    }

    /// Permissions held by `role`.
    pub fn permissions_for(&self, role: &Role) -> Result<&BTreeSet<Permission>, UnknownRole> {
        self.roles
            .get(role)
            .map(|def| &def.permissions)
            .ok_or_else(|| UnknownRole(role.clone()))
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    /// All role definitions, sorted by name.
    pub fn roles(&self) -> Vec<&RoleDefinition> {
        let mut roles: Vec<_> = self.roles.values().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

/// Startup check for a literal role table.
pub fn validate_role_table(table: &RoleTable) -> Result<(), RbacConfigError> {
    let mut seen = HashSet::new();
    for (name, _, _) in table {
        if name.trim().is_empty() {
            return Err(RbacConfigError::EmptyRoleName);
        }
        if !seen.insert(*name) {
            return Err(RbacConfigError::DuplicateRole(name.to_string()));
        }
    }
    Ok(())
}
