//! Infrastructure layer: user storage adapters and password hashing.

pub mod password;
pub mod read_model;
pub mod users;

pub use password::Argon2PasswordHasher;
pub use users::{InMemoryUserRepository, PostgresUserRepository};
