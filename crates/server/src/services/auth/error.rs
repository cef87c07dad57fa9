//! Authentication error types.

use thiserror::Error;

use super::secrets::SecretError;
use super::session::SessionError;
use crate::db::RepositoryError;

/// Errors that can occur during account and authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] stockmate_core::EmailError),

    /// A required field is missing or blank.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Email already registered.
    #[error("email already registered")]
    DuplicateEmail,

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, but login requires a verified account.
    #[error("account not verified")]
    NotVerified,

    /// Missing or rejected bearer token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The session's shop no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// OTP or reset token rejected.
    #[error("verification failed: {0}")]
    Secret(#[from] SecretError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<SessionError> for AuthError {
    fn from(_: SessionError) -> Self {
        Self::Unauthenticated
    }
}
