//! Shop account credentials: registration, password hashing, and login checks.

use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use serde::Deserialize;
use tracing::instrument;

use stockmate_core::{Email, ShopId};

use super::AuthError;
use crate::db::{RepositoryError, ShopStore};
use crate::models::{NewShop, PasswordHash, ShopAccount};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash checked against when the email is unknown, so both login failure
/// paths pay for one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("stockmate-dummy-password").ok().map(|h| h.as_str().to_owned()));

/// Registration input as submitted by a new shop.
#[derive(Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

/// Durable record of shop accounts and their password hashes.
#[derive(Clone)]
pub struct CredentialStore {
    shops: Arc<dyn ShopStore>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(shops: Arc<dyn ShopStore>) -> Self {
        Self { shops }
    }

    /// Create an unverified account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidInput` if a display field is blank.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::DuplicateEmail` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<ShopAccount, AuthError> {
        let email = Email::parse(&registration.email)?;
        let name = required("name", &registration.name)?;
        let phone = required("phone", &registration.phone)?;
        let address = required("address", &registration.address)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        self.shops
            .create(NewShop {
                name,
                email,
                phone,
                address,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<ShopAccount>, AuthError> {
        Ok(self.shops.find_by_email(email).await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn find_by_id(&self, id: ShopId) -> Result<Option<ShopAccount>, AuthError> {
        Ok(self.shops.find_by_id(id).await?)
    }

    /// Flip the account to verified. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if no account has this email.
    pub async fn mark_verified(&self, email: &Email) -> Result<(), AuthError> {
        if self.shops.mark_verified(email).await? {
            Ok(())
        } else {
            Err(AuthError::AccountNotFound)
        }
    }

    /// Store a new, already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if no account has this email.
    pub async fn update_password_hash(
        &self,
        email: &Email,
        hash: &PasswordHash,
    ) -> Result<(), AuthError> {
        if self.shops.update_password_hash(email, hash).await? {
            Ok(())
        } else {
            Err(AuthError::AccountNotFound)
        }
    }

    /// Check a login attempt.
    ///
    /// Unknown email, malformed email and wrong password all fail with the
    /// same `AuthError::InvalidCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on any mismatch.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ShopAccount, AuthError> {
        let Ok(email) = Email::parse(email) else {
            burn_dummy_verification(password);
            return Err(AuthError::InvalidCredentials);
        };

        let Some((shop, hash)) = self.shops.find_credentials(&email).await? else {
            burn_dummy_verification(password);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, hash.as_str())?;
        Ok(shop)
    }
}

fn required(field: &str, value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn burn_dummy_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if shorter than [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<PasswordHash, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| PasswordHash::new(hash.to_string()))
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PhcHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
