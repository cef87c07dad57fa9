//! Shop account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockmate_core::{Email, ShopId};

/// A tenant account (domain type).
///
/// Carries no password hash; that only travels as a [`PasswordHash`]
/// returned by the credential lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopAccount {
    /// Unique shop ID.
    pub id: ShopId,
    /// Display name.
    pub name: String,
    /// Login identifier, unique and lowercase.
    pub email: Email,
    /// Contact phone number.
    pub phone: String,
    /// Postal address.
    pub address: String,
    /// Whether the OTP verification flow has completed.
    pub verified: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a shop account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub password_hash: PasswordHash,
}

/// A PHC-format password hash string.
///
/// `Debug` is redacted so the hash never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash.
    #[must_use]
    pub const fn new(encoded: String) -> Self {
        Self(encoded)
    }

    /// The encoded hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

/// Public projection returned alongside a login token.
#[derive(Debug, Clone, Serialize)]
pub struct ShopSummary {
    pub id: ShopId,
    pub name: String,
    pub email: Email,
}

impl From<&ShopAccount> for ShopSummary {
    fn from(shop: &ShopAccount) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            email: shop.email.clone(),
        }
    }
}
