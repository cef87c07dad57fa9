//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Every response body is `{"error": "<message>"}`
//! with a stable message that never reveals whether an email is registered
//! or whether a resource exists under another shop.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ResourceError;
use crate::services::auth::{AuthError, SecretError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account or authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Warehouse or inventory operation failed.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        const UNAVAILABLE: (StatusCode, &str) =
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable");

        let (status, message) = match self {
            Self::Database(_)
            | Self::Auth(AuthError::Repository(_) | AuthError::Secret(SecretError::Repository(_)))
            | Self::Resource(ResourceError::Repository(_)) => UNAVAILABLE,
            Self::Internal(_) | Self::Auth(AuthError::PasswordHash) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::BadRequest(msg)
            | Self::Auth(AuthError::InvalidInput(msg) | AuthError::WeakPassword(msg))
            | Self::Resource(ResourceError::InvalidInput(msg)) => {
                return (StatusCode::BAD_REQUEST, msg.clone());
            }
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address"),
                AuthError::DuplicateEmail => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists",
                ),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
                AuthError::NotVerified => (StatusCode::FORBIDDEN, "Account not verified"),
                AuthError::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, "Authentication required")
                }
                AuthError::AccountNotFound => (StatusCode::UNAUTHORIZED, "Account not found"),
                AuthError::Secret(SecretError::NotFound) => (
                    StatusCode::BAD_REQUEST,
                    "Verification code not found or already used",
                ),
                AuthError::Secret(SecretError::Expired) => {
                    (StatusCode::BAD_REQUEST, "Verification code has expired")
                }
                AuthError::Secret(SecretError::Mismatch) => {
                    (StatusCode::BAD_REQUEST, "Verification code is incorrect")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            },
            Self::Resource(_) => (StatusCode::NOT_FOUND, "Not found"),
        };
        (status, message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated shop.
///
/// Called by the access gate so errors are associated with the acting shop.
pub fn set_sentry_user(shop_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(shop_id.to_string()),
            ..Default::default()
        }));
    });
}
