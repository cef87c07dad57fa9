//! Kinds of one-time verification secrets.

use serde::{Deserialize, Serialize};

/// What a verification secret authenticates.
///
/// At most one unconsumed secret per `(email, kind)` is live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "stockmate.secret_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
    /// Short numeric code proving control of the registered email.
    Otp,
    /// High-entropy opaque token authorizing a password rewrite.
    PasswordReset,
}

impl SecretKind {
    /// How long a freshly issued secret of this kind stays valid.
    #[must_use]
    pub fn lifetime(self) -> chrono::TimeDelta {
        match self {
            Self::Otp => chrono::TimeDelta::minutes(10),
            Self::PasswordReset => chrono::TimeDelta::minutes(15),
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Otp => write!(f, "otp"),
            Self::PasswordReset => write!(f, "password_reset"),
        }
    }
}
