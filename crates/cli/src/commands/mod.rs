//! Subcommand implementations.

pub mod migrate;
pub mod shop;

use secrecy::SecretString;
use thiserror::Error;

/// Error resolving the database connection string.
#[derive(Debug, Error)]
#[error("Missing environment variable: STOCKMATE_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// The `PostgreSQL` URL from `STOCKMATE_DATABASE_URL`, falling back to
/// `DATABASE_URL`. Loads `.env` first.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var("STOCKMATE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
