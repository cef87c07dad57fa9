//! Persistence for the StockMate server.
//!
//! # Database: `stockmate` schema
//!
//! ## Tables
//!
//! - `shop` - Tenant accounts and their password hashes
//! - `verification_secret` - OTP codes and password reset tokens (hashed)
//! - `warehouse` - Storage locations, owned by a shop
//! - `inventory_item` - Stock records, owned through their warehouse
//!
//! # Backends
//!
//! Every store is a trait so the account core can run against either
//! `PostgreSQL` ([`Stores::postgres`]) or the in-process [`MemoryStore`]. Both enforce
//! the same invariants: unique lowercase email, one live secret per
//! `(email, kind)`, compare-and-set consumption, and owner-filtered resource
//! operations.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p stockmate-cli -- migrate
//! ```

pub mod inventory;
pub mod memory;
pub mod secrets;
pub mod shops;
pub mod warehouses;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stockmate_core::{
    Email, InventoryItemId, Price, SecretId, SecretKind, ShopId, WarehouseId,
};

use crate::models::{
    InventoryItem, ItemDetailsUpdate, NewInventoryItem, NewSecret, NewShop, NewWarehouse,
    PasswordHash, ShopAccount, VerificationSecret, Warehouse,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-violation into `Conflict`, everything else into `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Durable record of shop accounts.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, shop: NewShop) -> Result<ShopAccount, RepositoryError>;

    async fn find_by_id(&self, id: ShopId) -> Result<Option<ShopAccount>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<ShopAccount>, RepositoryError>;

    /// The account together with its password hash, for credential checks only.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(ShopAccount, PasswordHash)>, RepositoryError>;

    /// Set `verified = true`. Returns `false` if no account has this email.
    async fn mark_verified(&self, email: &Email) -> Result<bool, RepositoryError>;

    /// Replace the stored hash. Returns `false` if no account has this email.
    async fn update_password_hash(
        &self,
        email: &Email,
        hash: &PasswordHash,
    ) -> Result<bool, RepositoryError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Storage for one-time verification secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store a secret, superseding any unconsumed secret of the same
    /// `(email, kind)`.
    async fn replace(&self, secret: NewSecret) -> Result<VerificationSecret, RepositoryError>;

    /// The live (unconsumed) secret for `(email, kind)`, expired or not.
    async fn find_unconsumed(
        &self,
        email: &Email,
        kind: SecretKind,
    ) -> Result<Option<VerificationSecret>, RepositoryError>;

    /// Atomically mark a secret consumed if it is still unconsumed and still
    /// carries `secret_hash`. Returns `true` for exactly one caller.
    async fn consume(
        &self,
        id: SecretId,
        secret_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

/// Storage for warehouses. Every lookup is filtered by owner.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn create(&self, warehouse: NewWarehouse) -> Result<Warehouse, RepositoryError>;

    async fn list_for_shop(&self, shop_id: ShopId) -> Result<Vec<Warehouse>, RepositoryError>;

    async fn find_owned(
        &self,
        id: WarehouseId,
        shop_id: ShopId,
    ) -> Result<Option<Warehouse>, RepositoryError>;

    /// Delete the warehouse (and its inventory) if `shop_id` owns it.
    async fn delete_owned(&self, id: WarehouseId, shop_id: ShopId)
    -> Result<bool, RepositoryError>;
}

/// Storage for inventory items. Every operation is scoped through the
/// owning warehouse's shop in a single filtered statement.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert only if the referenced warehouse belongs to `shop_id`.
    async fn create_owned(
        &self,
        shop_id: ShopId,
        item: NewInventoryItem,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    async fn list_for_shop(
        &self,
        shop_id: ShopId,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<InventoryItem>, RepositoryError>;

    async fn find_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    async fn set_quantity_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        quantity: i32,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    async fn set_price_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        price: Price,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    async fn update_details_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        update: ItemDetailsUpdate,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    async fn delete_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<bool, RepositoryError>;
}

/// The full set of stores the server needs.
#[derive(Clone)]
pub struct Stores {
    pub shops: Arc<dyn ShopStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub warehouses: Arc<dyn WarehouseStore>,
    pub inventory: Arc<dyn InventoryStore>,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            shops: Arc::new(shops::ShopRepository::new(pool.clone())),
            secrets: Arc::new(secrets::SecretRepository::new(pool.clone())),
            warehouses: Arc::new(warehouses::WarehouseRepository::new(pool.clone())),
            inventory: Arc::new(inventory::InventoryRepository::new(pool)),
        }
    }

    /// Stores backed by a single in-process [`MemoryStore`].
    #[must_use]
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            shops: store.clone(),
            secrets: store.clone(),
            warehouses: store.clone(),
            inventory: store,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
