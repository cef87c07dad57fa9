//! Business logic services for the StockMate server.
//!
//! # Services
//!
//! - `auth` - Shop accounts, one-time secrets, sessions, and the login and
//!   password reset flows
//! - `email` - Notification delivery (SMTP or log-only)
//! - `warehouses` - Tenant-scoped warehouse operations
//! - `inventory` - Tenant-scoped inventory item operations
//! - `clock` - Injectable time source

pub mod auth;
pub mod clock;
pub mod email;
pub mod inventory;
pub mod warehouses;

use thiserror::Error;

use crate::db::RepositoryError;

pub use inventory::InventoryService;
pub use warehouses::WarehouseService;

/// Errors from tenant-scoped resource operations.
///
/// `NotFound` covers both "does not exist" and "belongs to another shop".
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Trimmed copy of `value`, or `InvalidInput` naming `field` if it is blank.
pub(crate) fn non_blank(field: &str, value: &str) -> Result<String, ResourceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ResourceError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
