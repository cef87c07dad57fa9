//! Verification secret repository for `PostgreSQL`.
//!
//! A partial unique index on `(subject_email, kind) WHERE consumed_at IS NULL`
//! keeps a single live secret per pair; issuing upserts over it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockmate_core::{Email, SecretId, SecretKind};

use super::{RepositoryError, SecretStore};
use crate::models::{NewSecret, VerificationSecret};

/// Internal row type for secret queries.
#[derive(Debug, sqlx::FromRow)]
struct SecretRow {
    id: i32,
    subject_email: String,
    kind: SecretKind,
    secret_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SecretRow> for VerificationSecret {
    type Error = RepositoryError;

    fn try_from(row: SecretRow) -> Result<Self, Self::Error> {
        let subject_email = Email::parse(&row.subject_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: SecretId::new(row.id),
            subject_email,
            kind: row.kind,
            secret_hash: row.secret_hash,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            consumed_at: row.consumed_at,
        })
    }
}

/// Repository for verification secrets.
#[derive(Clone)]
pub struct SecretRepository {
    pool: PgPool,
}

impl SecretRepository {
    /// Create a new secret repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretStore for SecretRepository {
    async fn replace(&self, secret: NewSecret) -> Result<VerificationSecret, RepositoryError> {
        let row = sqlx::query_as::<_, SecretRow>(
            r"
            INSERT INTO stockmate.verification_secret
                (subject_email, kind, secret_hash, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject_email, kind) WHERE consumed_at IS NULL
            DO UPDATE SET
                secret_hash = EXCLUDED.secret_hash,
                issued_at = EXCLUDED.issued_at,
                expires_at = EXCLUDED.expires_at
            RETURNING id, subject_email, kind, secret_hash, issued_at, expires_at, consumed_at
            ",
        )
        .bind(secret.subject_email.as_str())
        .bind(secret.kind)
        .bind(&secret.secret_hash)
        .bind(secret.issued_at)
        .bind(secret.expires_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_unconsumed(
        &self,
        email: &Email,
        kind: SecretKind,
    ) -> Result<Option<VerificationSecret>, RepositoryError> {
        let row = sqlx::query_as::<_, SecretRow>(
            r"
            SELECT id, subject_email, kind, secret_hash, issued_at, expires_at, consumed_at
            FROM stockmate.verification_secret
            WHERE subject_email = $1 AND kind = $2 AND consumed_at IS NULL
            ",
        )
        .bind(email.as_str())
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn consume(
        &self,
        id: SecretId,
        secret_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE stockmate.verification_secret
            SET consumed_at = $3
            WHERE id = $1 AND secret_hash = $2 AND consumed_at IS NULL
            ",
        )
        .bind(id)
        .bind(secret_hash)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
