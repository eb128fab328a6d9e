//! `gatehouse-core`: shared identifiers and the domain error model.
//!
//! Nothing in here knows about tokens, HTTP or storage.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
