//! Warehouse repository for `PostgreSQL`.
//!
//! Every query that touches an existing row filters on both `id` and
//! `shop_id`, so a row owned by another shop is indistinguishable from a
//! missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockmate_core::{ShopId, WarehouseId};

use super::{RepositoryError, WarehouseStore};
use crate::models::{NewWarehouse, Warehouse};

/// Internal row type for warehouse queries.
#[derive(Debug, sqlx::FromRow)]
struct WarehouseRow {
    id: i32,
    shop_id: i32,
    name: String,
    location: String,
    capacity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Self {
            id: WarehouseId::new(row.id),
            shop_id: ShopId::new(row.shop_id),
            name: row.name,
            location: row.location,
            capacity: row.capacity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for warehouse database operations.
#[derive(Clone)]
pub struct WarehouseRepository {
    pool: PgPool,
}

impl WarehouseRepository {
    /// Create a new warehouse repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarehouseStore for WarehouseRepository {
    async fn create(&self, warehouse: NewWarehouse) -> Result<Warehouse, RepositoryError> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r"
            INSERT INTO stockmate.warehouse (shop_id, name, location, capacity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shop_id, name, location, capacity, created_at, updated_at
            ",
        )
        .bind(warehouse.shop_id)
        .bind(&warehouse.name)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> Result<Vec<Warehouse>, RepositoryError> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            r"
            SELECT id, shop_id, name, location, capacity, created_at, updated_at
            FROM stockmate.warehouse
            WHERE shop_id = $1
            ORDER BY id
            ",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_owned(
        &self,
        id: WarehouseId,
        shop_id: ShopId,
    ) -> Result<Option<Warehouse>, RepositoryError> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r"
            SELECT id, shop_id, name, location, capacity, created_at, updated_at
            FROM stockmate.warehouse
            WHERE id = $1 AND shop_id = $2
            ",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_owned(
        &self,
        id: WarehouseId,
        shop_id: ShopId,
    ) -> Result<bool, RepositoryError> {
        // inventory_item rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM stockmate.warehouse WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
