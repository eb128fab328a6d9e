//! `gatehouse-users`: user records and the user service.
//!
//! Storage and password hashing are ports (`UserRepository`,
//! `PasswordHasher`) implemented in `gatehouse-infra`.

pub mod error;
pub mod model;
pub mod ports;
pub mod service;

pub use error::UserServiceError;
pub use model::{
    NewUserRequest, RedactedUser, SigninRequest, SignupRequest, UserChanges, UserRecord,
};
pub use ports::{HashingError, PasswordHasher, RepositoryError, UserRepository};
pub use service::{Clock, IssuedToken, UserService, UserServiceConfig};
