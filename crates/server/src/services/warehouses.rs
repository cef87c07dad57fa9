//! Warehouse operations, always scoped to the acting shop.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use stockmate_core::{ShopId, WarehouseId};

use super::{ResourceError, non_blank};
use crate::db::WarehouseStore;
use crate::models::{NewWarehouse, Warehouse};

/// Input for creating a warehouse.
#[derive(Debug, Deserialize)]
pub struct CreateWarehouse {
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

#[derive(Clone)]
pub struct WarehouseService {
    store: Arc<dyn WarehouseStore>,
}

impl WarehouseService {
    #[must_use]
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self { store }
    }

    /// Create a warehouse owned by `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidInput` for a blank name or location or
    /// a non-positive capacity.
    #[instrument(skip(self, input), fields(shop_id = %shop_id))]
    pub async fn create(
        &self,
        shop_id: ShopId,
        input: CreateWarehouse,
    ) -> Result<Warehouse, ResourceError> {
        if input.capacity <= 0 {
            return Err(ResourceError::InvalidInput(
                "capacity must be a positive integer".to_string(),
            ));
        }

        let warehouse = self
            .store
            .create(NewWarehouse {
                shop_id,
                name: non_blank("name", &input.name)?,
                location: non_blank("location", &input.location)?,
                capacity: input.capacity,
            })
            .await?;

        info!(warehouse_id = %warehouse.id, "Warehouse created");
        Ok(warehouse)
    }

    /// # Errors
    ///
    /// Returns `ResourceError::Repository` if the lookup fails.
    pub async fn list(&self, shop_id: ShopId) -> Result<Vec<Warehouse>, ResourceError> {
        Ok(self.store.list_for_shop(shop_id).await?)
    }

    /// # Errors
    ///
    /// Returns `ResourceError::NotFound` unless `shop_id` owns the warehouse.
    pub async fn get(&self, shop_id: ShopId, id: WarehouseId) -> Result<Warehouse, ResourceError> {
        self.store
            .find_owned(id, shop_id)
            .await?
            .ok_or(ResourceError::NotFound)
    }

    /// Delete the warehouse and every item in it.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::NotFound` unless `shop_id` owns the warehouse.
    #[instrument(skip(self), fields(shop_id = %shop_id, warehouse_id = %id))]
    pub async fn delete(&self, shop_id: ShopId, id: WarehouseId) -> Result<(), ResourceError> {
        if !self.store.delete_owned(id, shop_id).await? {
            return Err(ResourceError::NotFound);
        }
        info!("Warehouse deleted");
        Ok(())
    }
}
