//! Verification secret domain types.

use chrono::{DateTime, Utc};

use stockmate_core::{Email, SecretId, SecretKind};

/// A stored one-time secret (OTP or password reset token).
///
/// Only the SHA-256 digest of the secret value is persisted; the plaintext
/// exists just long enough to be handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSecret {
    pub id: SecretId,
    pub subject_email: Email,
    pub kind: SecretKind,
    /// Hex-encoded SHA-256 of the secret value.
    pub secret_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl VerificationSecret {
    /// Whether the secret has been used (or burned by an expired attempt).
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Whether `now` is at or past the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Input for issuing a secret.
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub subject_email: Email,
    pub kind: SecretKind,
    pub secret_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
