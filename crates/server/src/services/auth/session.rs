//! Stateless bearer session tokens.
//!
//! Token layout: `base64url(claims_json) "." base64url(hmac_sha256(claims_b64))`.
//! The claims carry the shop id and absolute issue/expiry timestamps. There
//! is no server-side session table, so a token stays valid until `exp`.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::TimeDelta;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use stockmate_core::ShopId;

use crate::services::clock::Clock;

type HmacSha256 = Hmac<Sha256>;

/// Days an issued session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Why a bearer token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("session signature invalid")]
    SignatureInvalid,

    #[error("session expired")]
    Expired,
}

/// Signed payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject shop id.
    pub sub: ShopId,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Mints and checks session tokens with a process-wide signing key.
#[derive(Clone)]
pub struct SessionSigner {
    keyed: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    /// Key the signer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` if the MAC rejects the key.
    pub fn new(key: &SecretString, clock: Arc<dyn Clock>) -> Result<Self, InvalidLength> {
        let keyed = <HmacSha256 as Mac>::new_from_slice(key.expose_secret().as_bytes())?;
        Ok(Self { keyed, clock })
    }

    /// How long an issued session stays valid.
    #[must_use]
    pub fn ttl() -> TimeDelta {
        TimeDelta::days(SESSION_TTL_DAYS)
    }

    /// Mint a token for `shop_id` expiring [`Self::ttl`] from now.
    ///
    /// `exp` is whole seconds rounded up, so a token is never valid for less
    /// than the TTL (and at most one second more).
    #[must_use]
    pub fn issue(&self, shop_id: ShopId) -> String {
        let issued_at = self.clock.now();
        let expires_at = issued_at + Self::ttl();
        let claims = SessionClaims {
            sub: shop_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp() + i64::from(expires_at.timestamp_subsec_nanos() > 0),
        };

        // integer-only claims always serialize
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes()).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Check the signature and expiry, returning the subject shop id.
    ///
    /// # Errors
    ///
    /// - `SessionError::Malformed` if the token is not two base64url parts
    ///   with a JSON claims body
    /// - `SessionError::SignatureInvalid` if the MAC does not verify under
    ///   this signer's key
    /// - `SessionError::Expired` at or after the `exp` instant
    pub fn verify(&self, token: &str) -> Result<ShopId, SessionError> {
        let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::Malformed)?;

        self.mac(payload.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| SessionError::SignatureInvalid)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(SessionError::Expired);
        }

        Ok(claims.sub)
    }

    fn mac(&self, data: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use chrono::{DateTime, Utc};

    fn at(secs: i64, nanos: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(DateTime::from_timestamp(secs, nanos).unwrap()))
    }

    fn signer(key: &str, clock: Arc<ManualClock>) -> SessionSigner {
        SessionSigner::new(&SecretString::from(key.to_string()), clock).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let signer = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock);
        let token = signer.issue(ShopId::new(7));
        assert_eq!(signer.verify(&token), Ok(ShopId::new(7)));
    }

    #[test]
    fn test_valid_until_expiry_instant() {
        let clock = at(1_767_225_600, 0);
        let signer = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock.clone());
        let token = signer.issue(ShopId::new(1));

        clock.advance(SessionSigner::ttl() - TimeDelta::seconds(1));
        assert_eq!(signer.verify(&token), Ok(ShopId::new(1)));

        clock.advance(TimeDelta::seconds(1));
        assert_eq!(signer.verify(&token), Err(SessionError::Expired));
    }

    #[test]
    fn test_mid_second_issue_lives_full_ttl() {
        let clock = at(1_767_225_600, 500_000_000);
        let signer = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock.clone());
        let token = signer.issue(ShopId::new(1));

        clock.advance(SessionSigner::ttl());
        assert_eq!(signer.verify(&token), Ok(ShopId::new(1)));

        clock.advance(TimeDelta::milliseconds(500));
        assert_eq!(signer.verify(&token), Err(SessionError::Expired));
    }

    #[test]
    fn test_other_key_is_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ours = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock.clone());
        let theirs = signer("another-k3y-for-tests-bbbbbbbbbbbbb", clock);

        let token = theirs.issue(ShopId::new(1));
        assert_eq!(ours.verify(&token), Err(SessionError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let signer = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock);
        let token = signer.issue(ShopId::new(1));
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"sub":2,"iat":0,"exp":99999999999}"#);
        let forged = format!("{forged_claims}.{signature}");
        assert_eq!(signer.verify(&forged), Err(SessionError::SignatureInvalid));
    }

    #[test]
    fn test_malformed_tokens() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let signer = signer("k3y-for-tests-only-aaaaaaaaaaaaaaaa", clock);
        assert_eq!(signer.verify(""), Err(SessionError::Malformed));
        assert_eq!(signer.verify("no-dot"), Err(SessionError::Malformed));
        assert_eq!(signer.verify("abc.!!!"), Err(SessionError::Malformed));
    }
}
