//! Inventory item domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmate_core::{InventoryItemId, Price, WarehouseId};

/// A stock record held in one warehouse.
///
/// Ownership is transitive: an item belongs to the shop that owns its warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub warehouse_id: WarehouseId,
    pub product_name: String,
    pub sku: String,
    /// Units on hand, never negative.
    pub quantity: i32,
    pub price: Price,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an inventory item.
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub warehouse_id: WarehouseId,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub price: Price,
    pub category: String,
}

/// Partial update of descriptive fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemDetailsUpdate {
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
}

impl ItemDetailsUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.product_name.is_none() && self.sku.is_none() && self.category.is_none()
    }
}
