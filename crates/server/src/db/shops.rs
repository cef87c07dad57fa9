//! Shop account repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockmate_core::{Email, ShopId};

use super::{RepositoryError, ShopStore, map_unique_violation};
use crate::models::{NewShop, PasswordHash, ShopAccount};

const SHOP_COLUMNS: &str = "id, name, email, phone, address, verified, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for shop queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: i32,
    name: String,
    email: String,
    phone: String,
    address: String,
    verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for ShopAccount {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: ShopId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            address: row.address,
            verified: row.verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Shop row plus the password hash column.
#[derive(Debug, sqlx::FromRow)]
struct ShopCredentialRow {
    #[sqlx(flatten)]
    shop: ShopRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shop account database operations.
#[derive(Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for ShopRepository {
    async fn create(&self, shop: NewShop) -> Result<ShopAccount, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            r"
            INSERT INTO stockmate.shop (name, email, phone, address, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(&shop.name)
        .bind(shop.email.as_str())
        .bind(&shop.phone)
        .bind(&shop.address)
        .bind(shop.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: ShopId) -> Result<Option<ShopAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM stockmate.shop WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<ShopAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM stockmate.shop WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(ShopAccount, PasswordHash)>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopCredentialRow>(&format!(
            "SELECT {SHOP_COLUMNS}, password_hash FROM stockmate.shop WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((
                r.shop.try_into()?,
                PasswordHash::new(r.password_hash),
            ))),
            None => Ok(None),
        }
    }

    async fn mark_verified(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE stockmate.shop
            SET verified = TRUE, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(
        &self,
        email: &Email,
        hash: &PasswordHash,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE stockmate.shop
            SET password_hash = $2, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .bind(hash.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
