//! Account identity and access control.
//!
//! - [`credentials`] - account records and password checks
//! - [`secrets`] - one-time OTP codes and password reset tokens
//! - [`session`] - signed bearer tokens
//!
//! [`AccountService`] composes them into the registration, verification,
//! login and password reset flows, and resolves bearer tokens to accounts
//! for the access gate.

pub mod credentials;
mod error;
pub mod secrets;
pub mod session;

pub use credentials::{CredentialStore, Registration};
pub use error::AuthError;
pub use secrets::{SecretError, SecretManager};
pub use session::{SessionError, SessionSigner};

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};
use url::Url;

use stockmate_core::{Email, SecretKind};

use crate::models::{ShopAccount, ShopSummary};
use crate::services::email::{Notification, Notifier};

/// Successful login: a bearer token plus the public account summary.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub shop: ShopSummary,
}

/// Orchestrates the account lifecycle.
#[derive(Clone)]
pub struct AccountService {
    credentials: CredentialStore,
    secrets: SecretManager,
    sessions: SessionSigner,
    notifier: Arc<dyn Notifier>,
    base_url: Url,
    require_verified_login: bool,
}

impl AccountService {
    #[must_use]
    pub fn new(
        credentials: CredentialStore,
        secrets: SecretManager,
        sessions: SessionSigner,
        notifier: Arc<dyn Notifier>,
        base_url: Url,
        require_verified_login: bool,
    ) -> Self {
        Self {
            credentials,
            secrets,
            sessions,
            notifier,
            base_url,
            require_verified_login,
        }
    }

    /// The underlying credential store.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // =========================================================================
    // Registration & verification
    // =========================================================================

    /// Create an unverified account, then send the welcome email and an OTP.
    ///
    /// Delivery failures are logged and do not fail registration; the shop
    /// can ask for a fresh code with [`Self::resend_otp`].
    ///
    /// # Errors
    ///
    /// Returns the `CredentialStore::register` errors, or
    /// `AuthError::Secret` if the OTP cannot be stored.
    pub async fn register(&self, registration: Registration) -> Result<ShopAccount, AuthError> {
        let shop = self.credentials.register(registration).await?;
        info!(shop_id = %shop.id, "Shop registered");

        self.deliver(
            &shop.email,
            Notification::Welcome {
                name: shop.name.clone(),
            },
        )
        .await;
        self.send_otp(&shop).await?;

        Ok(shop)
    }

    /// Consume the OTP for `email` and mark the account verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Secret` with the secret's failure kind, or
    /// `AuthError::AccountNotFound` if the account vanished meanwhile.
    #[instrument(skip(self, otp))]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.secrets.verify(&email, SecretKind::Otp, otp.trim()).await?;
        self.credentials.mark_verified(&email).await?;
        info!(email = %email, "Shop verified");
        Ok(())
    }

    /// Issue a fresh OTP (superseding the previous one) if `email` belongs
    /// to an unverified account. Succeeds silently otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or a
    /// store failure.
    #[instrument(skip(self))]
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self.credentials.find_by_email(&email).await? {
            Some(shop) if !shop.verified => self.send_otp(&shop).await,
            _ => Ok(()),
        }
    }

    async fn send_otp(&self, shop: &ShopAccount) -> Result<(), AuthError> {
        let code = self.secrets.issue(&shop.email, SecretKind::Otp).await?;
        self.deliver(
            &shop.email,
            Notification::Otp {
                name: shop.name.clone(),
                code,
            },
        )
        .await;
        Ok(())
    }

    // =========================================================================
    // Login & session resolution
    // =========================================================================

    /// Check credentials and mint a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any unknown email or wrong
    /// password, and `AuthError::NotVerified` when verified login is required
    /// and the (correct) credentials belong to an unverified account.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let shop = self.credentials.verify_credentials(email, password).await?;

        if self.require_verified_login && !shop.verified {
            return Err(AuthError::NotVerified);
        }

        let token = self.sessions.issue(shop.id);
        info!(shop_id = %shop.id, "Shop logged in");

        Ok(LoginOutcome {
            token,
            shop: ShopSummary::from(&shop),
        })
    }

    /// Resolve a bearer token to its account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the token is rejected, and
    /// `AuthError::AccountNotFound` if its shop no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<ShopAccount, AuthError> {
        let shop_id = self.sessions.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AuthError::from(e)
        })?;

        self.credentials
            .find_by_id(shop_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Send a reset link if `email` belongs to an account. Succeeds the same
    /// way whether or not it does.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or a
    /// store failure.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let Some(shop) = self.credentials.find_by_email(&email).await? else {
            return Ok(());
        };

        let token = self.secrets.issue(&email, SecretKind::PasswordReset).await?;
        let reset_url = reset_link(&self.base_url, &token, &email);
        self.deliver(
            &email,
            Notification::PasswordReset {
                name: shop.name,
                reset_url: reset_url.into(),
            },
        )
        .await;
        Ok(())
    }

    /// Consume the reset token and store the new password.
    ///
    /// The password policy is checked first, so a rejected password leaves
    /// the token usable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword`, `AuthError::Secret` with the token's
    /// failure kind, or `AuthError::AccountNotFound`.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        credentials::validate_password(new_password)?;

        self.secrets
            .verify(&email, SecretKind::PasswordReset, token)
            .await?;

        let hash = credentials::hash_password(new_password)?;
        self.credentials.update_password_hash(&email, &hash).await?;
        info!(email = %email, "Password reset");
        Ok(())
    }

    async fn deliver(&self, to: &Email, notification: Notification) {
        if let Err(e) = self.notifier.send(to, &notification).await {
            error!(
                to = %to,
                kind = %notification.kind(),
                error = %e,
                "Notification delivery failed"
            );
        }
    }
}

/// `{base}/reset-password/{token}?email={email}`
fn reset_link(base: &Url, token: &str, email: &Email) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("reset-password").push(token);
    }
    url.query_pairs_mut().append_pair("email", email.as_str());
    url
}
