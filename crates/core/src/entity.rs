//! Entity trait: identity + tenant ownership.

use crate::id::TenantId;

/// A record with a stable identity that lives inside exactly one tenant.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Tenant (namespace) the entity belongs to. Never changes after creation.
    fn tenant_id(&self) -> TenantId;
}
