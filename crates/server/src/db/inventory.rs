//! Inventory item repository for `PostgreSQL`.
//!
//! Items carry no owner column of their own; each statement joins through
//! `stockmate.warehouse` and filters on the acting shop in the same query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockmate_core::{InventoryItemId, Price, ShopId, WarehouseId};

use super::{InventoryStore, RepositoryError};
use crate::models::{InventoryItem, ItemDetailsUpdate, NewInventoryItem};

const ITEM_COLUMNS: &str = "i.id, i.warehouse_id, i.product_name, i.sku, i.quantity, i.price, \
                            i.category, i.created_at, i.updated_at";

/// Internal row type for inventory item queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryItemRow {
    id: i32,
    warehouse_id: i32,
    product_name: String,
    sku: String,
    quantity: i32,
    price: Price,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryItemRow> for InventoryItem {
    fn from(row: InventoryItemRow) -> Self {
        Self {
            id: InventoryItemId::new(row.id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            product_name: row.product_name,
            sku: row.sku,
            quantity: row.quantity,
            price: row.price,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for inventory item database operations.
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn create_owned(
        &self,
        shop_id: ShopId,
        item: NewInventoryItem,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        // INSERT ... SELECT yields zero rows when the warehouse is not the shop's
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            INSERT INTO stockmate.inventory_item AS i
                (warehouse_id, product_name, sku, quantity, price, category)
            SELECT w.id, $3, $4, $5, $6, $7
            FROM stockmate.warehouse w
            WHERE w.id = $1 AND w.shop_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(item.warehouse_id)
        .bind(shop_id)
        .bind(&item.product_name)
        .bind(&item.sku)
        .bind(item.quantity)
        .bind(item.price)
        .bind(&item.category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_for_shop(
        &self,
        shop_id: ShopId,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM stockmate.inventory_item i
            JOIN stockmate.warehouse w ON w.id = i.warehouse_id
            WHERE w.shop_id = $1 AND ($2::INT IS NULL OR i.warehouse_id = $2)
            ORDER BY i.id
            "
        ))
        .bind(shop_id)
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM stockmate.inventory_item i
            JOIN stockmate.warehouse w ON w.id = i.warehouse_id
            WHERE i.id = $1 AND w.shop_id = $2
            "
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn set_quantity_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        quantity: i32,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            UPDATE stockmate.inventory_item i
            SET quantity = $3, updated_at = NOW()
            FROM stockmate.warehouse w
            WHERE i.id = $1 AND i.warehouse_id = w.id AND w.shop_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(shop_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn set_price_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        price: Price,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            UPDATE stockmate.inventory_item i
            SET price = $3, updated_at = NOW()
            FROM stockmate.warehouse w
            WHERE i.id = $1 AND i.warehouse_id = w.id AND w.shop_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(shop_id)
        .bind(price)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_details_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        update: ItemDetailsUpdate,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            UPDATE stockmate.inventory_item i
            SET product_name = COALESCE($3, i.product_name),
                sku = COALESCE($4, i.sku),
                category = COALESCE($5, i.category),
                updated_at = NOW()
            FROM stockmate.warehouse w
            WHERE i.id = $1 AND i.warehouse_id = w.id AND w.shop_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(shop_id)
        .bind(update.product_name)
        .bind(update.sku)
        .bind(update.category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM stockmate.inventory_item i
            USING stockmate.warehouse w
            WHERE i.id = $1 AND i.warehouse_id = w.id AND w.shop_id = $2
            ",
        )
        .bind(id)
        .bind(shop_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
