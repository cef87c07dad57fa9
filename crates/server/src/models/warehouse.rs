//! Warehouse domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmate_core::{ShopId, WarehouseId};

/// A storage location owned by exactly one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub shop_id: ShopId,
    pub name: String,
    pub location: String,
    /// Positive storage capacity in units.
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a warehouse.
#[derive(Debug, Clone)]
pub struct NewWarehouse {
    pub shop_id: ShopId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
}
