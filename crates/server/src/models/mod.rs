//! Domain models for the StockMate server.
//!
//! These are validated domain types. Database row types live next to the
//! queries in [`crate::db`] and convert into these.

pub mod inventory;
pub mod secret;
pub mod shop;
pub mod warehouse;

pub use inventory::{InventoryItem, ItemDetailsUpdate, NewInventoryItem};
pub use secret::{NewSecret, VerificationSecret};
pub use shop::{NewShop, PasswordHash, ShopAccount, ShopSummary};
pub use warehouse::{NewWarehouse, Warehouse};
