use thiserror::Error;

use gatehouse_auth::{AuthzError, TokenError};
use gatehouse_core::DomainError;

use crate::ports::{HashingError, RepositoryError};

/// Everything a user-service operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserServiceError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("passwords do not match")]
    PasswordsDontMatch,

    #[error("password is too weak (minimum {min_length} characters)")]
    WeakPassword { min_length: usize },

    #[error("a user with that email already exists")]
    EmailTaken,

    /// Deliberately the same for unknown email and wrong password.
    #[error("unable to login with that email and password combination")]
    InvalidCredentials,

    #[error("user not found")]
    NotFound,

    /// The claim is valid but its subject was deleted since signing.
    #[error("token subject no longer exists")]
    SubjectNotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Hashing(#[from] HashingError),
}
