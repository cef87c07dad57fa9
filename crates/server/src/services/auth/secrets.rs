//! One-time verification secrets: email OTP codes and password reset tokens.
//!
//! Plaintext values leave this module exactly once, as the return value of
//! [`SecretManager::issue`], for delivery. Only their SHA-256 digests are
//! stored. Verification compares digests in constant time and consumes the
//! secret with a compare-and-set on the store, so of two concurrent correct
//! attempts at most one succeeds.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, instrument};

use stockmate_core::{Email, SecretKind};

use crate::db::{RepositoryError, SecretStore};
use crate::models::NewSecret;
use crate::services::clock::Clock;

/// Bytes of entropy in a password reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Why a submitted secret was rejected.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No live secret for this email and kind (never issued, already used,
    /// or superseded).
    #[error("no pending secret")]
    NotFound,

    /// The live secret's window has closed. It is burned on this attempt.
    #[error("secret expired")]
    Expired,

    /// The value does not match. The secret stays live.
    #[error("secret mismatch")]
    Mismatch,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Issues and verifies one-time secrets.
#[derive(Clone)]
pub struct SecretManager {
    secrets: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
}

impl SecretManager {
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretStore>, clock: Arc<dyn Clock>) -> Self {
        Self { secrets, clock }
    }

    /// Generate a fresh secret for `(email, kind)`, superseding any unconsumed
    /// one, and return its plaintext for delivery.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Repository` if the secret cannot be stored.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn issue(&self, email: &Email, kind: SecretKind) -> Result<String, SecretError> {
        let value = match kind {
            SecretKind::Otp => generate_otp(),
            SecretKind::PasswordReset => generate_reset_token(),
        };

        let issued_at = self.clock.now();
        self.secrets
            .replace(NewSecret {
                subject_email: email.clone(),
                kind,
                secret_hash: digest_hex(&value),
                issued_at,
                expires_at: issued_at + kind.lifetime(),
            })
            .await?;

        debug!(%kind, "secret issued");
        Ok(value)
    }

    /// Check `candidate` against the live secret for `(email, kind)` and
    /// consume it on a match.
    ///
    /// # Errors
    ///
    /// - `SecretError::NotFound` if nothing is pending, or another caller
    ///   consumed it first
    /// - `SecretError::Expired` if the window has closed (the secret is
    ///   consumed so it cannot be retried)
    /// - `SecretError::Mismatch` if the value is wrong
    #[instrument(skip(self, candidate), fields(email = %email))]
    pub async fn verify(
        &self,
        email: &Email,
        kind: SecretKind,
        candidate: &str,
    ) -> Result<(), SecretError> {
        let secret = self
            .secrets
            .find_unconsumed(email, kind)
            .await?
            .ok_or(SecretError::NotFound)?;

        let now = self.clock.now();
        if secret.is_expired_at(now) {
            self.secrets
                .consume(secret.id, &secret.secret_hash, now)
                .await?;
            return Err(SecretError::Expired);
        }

        if !digest_matches(candidate, &secret.secret_hash) {
            return Err(SecretError::Mismatch);
        }

        if !self
            .secrets
            .consume(secret.id, &secret.secret_hash, now)
            .await?
        {
            return Err(SecretError::NotFound);
        }

        debug!(%kind, "secret consumed");
        Ok(())
    }
}

/// Six-digit numeric code, uniformly drawn from `100000..=999999`.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// 32 random bytes, base64url without padding (43 characters, path-safe).
#[must_use]
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of a secret value, the form kept in storage.
#[must_use]
pub fn digest_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn digest_matches(candidate: &str, stored_hex: &str) -> bool {
    let Ok(stored) = hex::decode(stored_hex) else {
        return false;
    };
    let computed = Sha256::digest(candidate.as_bytes());
    computed.as_slice().ct_eq(&stored).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::clock::ManualClock;
    use chrono::{TimeDelta, Utc};

    fn manager() -> (SecretManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryStore::new());
        (SecretManager::new(store, clock.clone()), clock)
    }

    fn email() -> Email {
        Email::parse("shop@x.com").unwrap()
    }

    #[test]
    fn test_otp_format() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_reset_token_is_url_safe() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_digest_matches() {
        let stored = digest_hex("482913");
        assert!(digest_matches("482913", &stored));
        assert!(!digest_matches("482914", &stored));
        assert!(!digest_matches("482913", "not-hex"));
    }

    #[tokio::test]
    async fn test_verify_succeeds_once() {
        let (manager, _) = manager();
        let code = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        manager.verify(&email(), SecretKind::Otp, &code).await.unwrap();
        let second = manager.verify(&email(), SecretKind::Otp, &code).await;
        assert!(matches!(second, Err(SecretError::NotFound)));
    }

    #[tokio::test]
    async fn test_mismatch_keeps_secret_live() {
        let (manager, _) = manager();
        let code = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        let wrong = manager.verify(&email(), SecretKind::Otp, "000000").await;
        assert!(matches!(wrong, Err(SecretError::Mismatch)));
        manager.verify(&email(), SecretKind::Otp, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_secret_is_burned() {
        let (manager, clock) = manager();
        let code = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        clock.advance(TimeDelta::minutes(10));
        let expired = manager.verify(&email(), SecretKind::Otp, &code).await;
        assert!(matches!(expired, Err(SecretError::Expired)));

        let retry = manager.verify(&email(), SecretKind::Otp, &code).await;
        assert!(matches!(retry, Err(SecretError::NotFound)));
    }

    #[tokio::test]
    async fn test_just_before_expiry_verifies() {
        let (manager, clock) = manager();
        let token = manager
            .issue(&email(), SecretKind::PasswordReset)
            .await
            .unwrap();

        clock.advance(TimeDelta::minutes(15) - TimeDelta::seconds(1));
        manager
            .verify(&email(), SecretKind::PasswordReset, &token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reissue_supersedes() {
        let (manager, _) = manager();
        let first = manager.issue(&email(), SecretKind::Otp).await.unwrap();
        let second = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        if first != second {
            let stale = manager.verify(&email(), SecretKind::Otp, &first).await;
            assert!(matches!(stale, Err(SecretError::Mismatch)));
        }
        manager.verify(&email(), SecretKind::Otp, &second).await.unwrap();
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let (manager, _) = manager();
        let code = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        let wrong_kind = manager
            .verify(&email(), SecretKind::PasswordReset, &code)
            .await;
        assert!(matches!(wrong_kind, Err(SecretError::NotFound)));
        manager.verify(&email(), SecretKind::Otp, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_verify_single_winner() {
        let (manager, _) = manager();
        let code = manager.issue(&email(), SecretKind::Otp).await.unwrap();

        let attempts = (0..8).map(|_| {
            let manager = manager.clone();
            let code = code.clone();
            tokio::spawn(async move { manager.verify(&email(), SecretKind::Otp, &code).await })
        });
        let mut successes = 0;
        for handle in attempts.collect::<Vec<_>>() {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
