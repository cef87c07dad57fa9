//! Inventory item operations, scoped through the owning warehouse's shop.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use stockmate_core::{InventoryItemId, Price, ShopId, WarehouseId};

use super::{ResourceError, non_blank};
use crate::db::InventoryStore;
use crate::models::{InventoryItem, ItemDetailsUpdate, NewInventoryItem};

/// Input for creating an inventory item.
#[derive(Debug, Deserialize)]
pub struct CreateItem {
    pub warehouse_id: WarehouseId,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub price: Decimal,
    pub category: String,
}

/// Partial update of descriptive fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemDetails {
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

impl InventoryService {
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Create an item in one of `shop_id`'s warehouses.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidInput` for blank text fields, negative
    /// quantity or negative price, and `ResourceError::NotFound` if the
    /// warehouse is missing or belongs to another shop.
    #[instrument(skip(self, input), fields(shop_id = %shop_id, warehouse_id = %input.warehouse_id))]
    pub async fn create(
        &self,
        shop_id: ShopId,
        input: CreateItem,
    ) -> Result<InventoryItem, ResourceError> {
        let item = NewInventoryItem {
            warehouse_id: input.warehouse_id,
            product_name: non_blank("product_name", &input.product_name)?,
            sku: non_blank("sku", &input.sku)?,
            quantity: validate_quantity(input.quantity)?,
            price: validate_price(input.price)?,
            category: non_blank("category", &input.category)?,
        };

        let item = self
            .store
            .create_owned(shop_id, item)
            .await?
            .ok_or(ResourceError::NotFound)?;

        info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    /// All of `shop_id`'s items, optionally limited to one warehouse.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Repository` if the lookup fails.
    pub async fn list(
        &self,
        shop_id: ShopId,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<InventoryItem>, ResourceError> {
        Ok(self.store.list_for_shop(shop_id, warehouse_id).await?)
    }

    /// # Errors
    ///
    /// Returns `ResourceError::NotFound` unless `shop_id` owns the item.
    pub async fn get(
        &self,
        shop_id: ShopId,
        id: InventoryItemId,
    ) -> Result<InventoryItem, ResourceError> {
        self.store
            .find_owned(id, shop_id)
            .await?
            .ok_or(ResourceError::NotFound)
    }

    /// Set the on-hand quantity.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidInput` for a negative quantity and
    /// `ResourceError::NotFound` unless `shop_id` owns the item.
    pub async fn set_quantity(
        &self,
        shop_id: ShopId,
        id: InventoryItemId,
        quantity: i32,
    ) -> Result<InventoryItem, ResourceError> {
        let quantity = validate_quantity(quantity)?;
        self.store
            .set_quantity_owned(id, shop_id, quantity)
            .await?
            .ok_or(ResourceError::NotFound)
    }

    /// Set the unit price.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidInput` for a negative price and
    /// `ResourceError::NotFound` unless `shop_id` owns the item.
    pub async fn set_price(
        &self,
        shop_id: ShopId,
        id: InventoryItemId,
        price: Decimal,
    ) -> Result<InventoryItem, ResourceError> {
        let price = validate_price(price)?;
        self.store
            .set_price_owned(id, shop_id, price)
            .await?
            .ok_or(ResourceError::NotFound)
    }

    /// Change name, SKU or category. Omitted fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidInput` if nothing is supplied or a
    /// supplied field is blank, and `ResourceError::NotFound` unless
    /// `shop_id` owns the item.
    pub async fn update_details(
        &self,
        shop_id: ShopId,
        id: InventoryItemId,
        input: UpdateItemDetails,
    ) -> Result<InventoryItem, ResourceError> {
        let update = ItemDetailsUpdate {
            product_name: optional_non_blank("product_name", input.product_name)?,
            sku: optional_non_blank("sku", input.sku)?,
            category: optional_non_blank("category", input.category)?,
        };
        if update.is_empty() {
            return Err(ResourceError::InvalidInput(
                "no fields to update".to_string(),
            ));
        }

        self.store
            .update_details_owned(id, shop_id, update)
            .await?
            .ok_or(ResourceError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `ResourceError::NotFound` unless `shop_id` owns the item.
    #[instrument(skip(self), fields(shop_id = %shop_id, item_id = %id))]
    pub async fn delete(&self, shop_id: ShopId, id: InventoryItemId) -> Result<(), ResourceError> {
        if !self.store.delete_owned(id, shop_id).await? {
            return Err(ResourceError::NotFound);
        }
        info!("Inventory item deleted");
        Ok(())
    }
}

fn validate_quantity(quantity: i32) -> Result<i32, ResourceError> {
    if quantity < 0 {
        return Err(ResourceError::InvalidInput(
            "quantity cannot be negative".to_string(),
        ));
    }
    Ok(quantity)
}

fn validate_price(price: Decimal) -> Result<Price, ResourceError> {
    Price::new(price).map_err(|e| ResourceError::InvalidInput(e.to_string()))
}

fn optional_non_blank(field: &str, value: Option<String>) -> Result<Option<String>, ResourceError> {
    value.map(|v| non_blank(field, &v)).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, ShopStore, WarehouseStore};
    use crate::models::{NewShop, NewWarehouse, PasswordHash};
    use stockmate_core::Email;

    struct Fixture {
        service: InventoryService,
        owner: ShopId,
        intruder: ShopId,
        warehouse: WarehouseId,
        foreign_warehouse: WarehouseId,
    }

    async fn tenant(store: &MemoryStore, email: &str) -> (ShopId, WarehouseId) {
        let shop = ShopStore::create(
            store,
            NewShop {
                name: "Shop".to_string(),
                email: Email::parse(email).unwrap(),
                phone: "555-0100".to_string(),
                address: "1 High St".to_string(),
                password_hash: PasswordHash::new("hash".to_string()),
            },
        )
        .await
        .unwrap();
        let warehouse = WarehouseStore::create(
            store,
            NewWarehouse {
                shop_id: shop.id,
                name: "Main".to_string(),
                location: "Dock 4".to_string(),
                capacity: 500,
            },
        )
        .await
        .unwrap();
        (shop.id, warehouse.id)
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let (owner, warehouse) = tenant(&store, "a@x.com").await;
        let (intruder, foreign_warehouse) = tenant(&store, "b@x.com").await;
        Fixture {
            service: InventoryService::new(store),
            owner,
            intruder,
            warehouse,
            foreign_warehouse,
        }
    }

    fn create_input(warehouse_id: WarehouseId) -> CreateItem {
        CreateItem {
            warehouse_id,
            product_name: "Widget".to_string(),
            sku: "W-1".to_string(),
            quantity: 12,
            price: Decimal::new(450, 2),
            category: "parts".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_in_own_warehouse() {
        let f = fixture().await;
        let item = f
            .service
            .create(f.owner, create_input(f.warehouse))
            .await
            .unwrap();
        assert_eq!(item.quantity, 12);
        assert_eq!(item.price.amount(), Decimal::new(450, 2));
    }

    #[tokio::test]
    async fn test_create_in_foreign_warehouse_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .create(f.owner, create_input(f.foreign_warehouse))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::NotFound));
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let f = fixture().await;

        let mut negative_qty = create_input(f.warehouse);
        negative_qty.quantity = -1;
        let mut negative_price = create_input(f.warehouse);
        negative_price.price = Decimal::new(-1, 2);
        let mut fractional_cent = create_input(f.warehouse);
        fractional_cent.price = Decimal::new(19_999, 3);
        let mut oversized_price = create_input(f.warehouse);
        oversized_price.price = Decimal::new(123_456_789_012_345_999, 3);
        let mut blank_sku = create_input(f.warehouse);
        blank_sku.sku = " ".to_string();

        for input in [
            negative_qty,
            negative_price,
            fractional_cent,
            oversized_price,
            blank_sku,
        ] {
            let err = f.service.create(f.owner, input).await.unwrap_err();
            assert!(matches!(err, ResourceError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_updates_by_other_shop_are_not_found() {
        let f = fixture().await;
        let item = f
            .service
            .create(f.owner, create_input(f.warehouse))
            .await
            .unwrap();

        let results = [
            f.service.get(f.intruder, item.id).await.err(),
            f.service.set_quantity(f.intruder, item.id, 1).await.err(),
            f.service.set_price(f.intruder, item.id, Decimal::ONE).await.err(),
            f.service
                .update_details(
                    f.intruder,
                    item.id,
                    UpdateItemDetails {
                        sku: Some("X".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .err(),
            f.service.delete(f.intruder, item.id).await.err(),
        ];
        for result in results {
            assert!(matches!(result, Some(ResourceError::NotFound)));
        }

        let unchanged = f.service.get(f.owner, item.id).await.unwrap();
        assert_eq!(unchanged, item);
    }

    #[tokio::test]
    async fn test_owner_updates() {
        let f = fixture().await;
        let item = f
            .service
            .create(f.owner, create_input(f.warehouse))
            .await
            .unwrap();

        let item = f.service.set_quantity(f.owner, item.id, 0).await.unwrap();
        assert_eq!(item.quantity, 0);
        let item = f.service.set_price(f.owner, item.id, Decimal::new(999, 2)).await.unwrap();
        assert_eq!(item.price.amount(), Decimal::new(999, 2));
        let item = f
            .service
            .update_details(
                f.owner,
                item.id,
                UpdateItemDetails {
                    category: Some("tools".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(item.category, "tools");
        assert_eq!(item.sku, "W-1");
    }

    #[tokio::test]
    async fn test_empty_details_update_is_rejected() {
        let f = fixture().await;
        let item = f
            .service
            .create(f.owner, create_input(f.warehouse))
            .await
            .unwrap();
        let err = f
            .service
            .update_details(f.owner, item.id, UpdateItemDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_warehouse() {
        let f = fixture().await;
        f.service
            .create(f.owner, create_input(f.warehouse))
            .await
            .unwrap();

        assert_eq!(f.service.list(f.owner, None).await.unwrap().len(), 1);
        assert_eq!(
            f.service
                .list(f.owner, Some(f.foreign_warehouse))
                .await
                .unwrap()
                .len(),
            0
        );
        assert!(f.service.list(f.intruder, None).await.unwrap().is_empty());
    }
}
