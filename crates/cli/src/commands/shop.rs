//! Shop account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a shop; the password is read from standard input
//! echo 'correct horse' | stockmate shop create -e owner@example.com -n "Corner Shop" \
//!     -p 555-0100 -a "1 High St" --verified
//!
//! # Mark an existing shop verified (skips the OTP step)
//! stockmate shop verify -e owner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKMATE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::io::BufRead;

use thiserror::Error;

use stockmate_core::Email;
use stockmate_server::db::{Stores, create_pool};
use stockmate_server::services::auth::{AuthError, CredentialStore, Registration};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error(transparent)]
    MissingDatabaseUrl(#[from] MissingDatabaseUrl),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not read password from stdin: {0}")]
    Stdin(#[from] std::io::Error),

    #[error("{0}")]
    Account(#[from] AuthError),
}

/// Fields for `shop create`.
pub struct NewShopArgs {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub verified: bool,
}

async fn credentials() -> Result<CredentialStore, ShopError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;
    Ok(CredentialStore::new(Stores::postgres(pool).shops))
}

/// Create a shop account, applying the same validation as the API.
///
/// # Returns
///
/// The ID of the created shop.
///
/// # Errors
///
/// Returns `ShopError::Account` for invalid input or a taken email.
pub async fn create(args: NewShopArgs) -> Result<i32, ShopError> {
    let password = read_password(std::io::stdin().lock())?;
    let credentials = credentials().await?;

    let shop = credentials
        .register(Registration {
            name: args.name,
            email: args.email,
            password,
            phone: args.phone,
            address: args.address,
        })
        .await?;

    if args.verified {
        credentials.mark_verified(&shop.email).await?;
    }

    tracing::info!(
        shop_id = %shop.id,
        email = %shop.email,
        verified = args.verified,
        "Shop created"
    );
    Ok(shop.id.as_i32())
}

/// Mark a shop verified without the OTP step.
///
/// # Errors
///
/// Returns `ShopError::Account` if the email is malformed or unknown.
pub async fn verify(email: &str) -> Result<(), ShopError> {
    let email = Email::parse(email).map_err(AuthError::from)?;
    credentials().await?.mark_verified(&email).await?;
    tracing::info!(email = %email, "Shop verified");
    Ok(())
}

/// First line of `input`, without its line ending.
fn read_password(mut input: impl BufRead) -> Result<String, std::io::Error> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
