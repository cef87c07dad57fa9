//! In-process store implementing every repository trait.
//!
//! Used when `STOCKMATE_DATABASE_URL` starts with `memory://` and by the test
//! suites. All tables sit behind one mutex, so each trait method is a single
//! atomic step, matching what the `PostgreSQL` statements guarantee.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use stockmate_core::{Email, InventoryItemId, Price, SecretId, SecretKind, ShopId, WarehouseId};

use super::{InventoryStore, RepositoryError, SecretStore, ShopStore, WarehouseStore};
use crate::models::{
    InventoryItem, ItemDetailsUpdate, NewInventoryItem, NewSecret, NewShop, NewWarehouse,
    PasswordHash, ShopAccount, VerificationSecret, Warehouse,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    shops: BTreeMap<ShopId, (ShopAccount, PasswordHash)>,
    secrets: BTreeMap<SecretId, VerificationSecret>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    items: BTreeMap<InventoryItemId, InventoryItem>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn shop_by_email_mut(&mut self, email: &Email) -> Option<&mut (ShopAccount, PasswordHash)> {
        self.shops.values_mut().find(|(shop, _)| &shop.email == email)
    }

    fn owns_warehouse(&self, warehouse_id: WarehouseId, shop_id: ShopId) -> bool {
        self.warehouses
            .get(&warehouse_id)
            .is_some_and(|w| w.shop_id == shop_id)
    }

    fn owned_item_mut(
        &mut self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Option<&mut InventoryItem> {
        let warehouse_id = self.items.get(&id)?.warehouse_id;
        if !self.owns_warehouse(warehouse_id, shop_id) {
            return None;
        }
        self.items.get_mut(&id)
    }
}

/// Shared in-memory backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn create(&self, shop: NewShop) -> Result<ShopAccount, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.shop_by_email_mut(&shop.email).is_some() {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        let now = Utc::now();
        let account = ShopAccount {
            id: ShopId::new(tables.next_id()),
            name: shop.name,
            email: shop.email,
            phone: shop.phone,
            address: shop.address,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        tables
            .shops
            .insert(account.id, (account.clone(), shop.password_hash));
        Ok(account)
    }

    async fn find_by_id(&self, id: ShopId) -> Result<Option<ShopAccount>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.shops.get(&id).map(|(shop, _)| shop.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<ShopAccount>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.shop_by_email_mut(email).map(|(shop, _)| shop.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(ShopAccount, PasswordHash)>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.shop_by_email_mut(email).map(|entry| entry.clone()))
    }

    async fn mark_verified(&self, email: &Email) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.shop_by_email_mut(email).is_some_and(|(shop, _)| {
            shop.verified = true;
            shop.updated_at = Utc::now();
            true
        }))
    }

    async fn update_password_hash(
        &self,
        email: &Email,
        hash: &PasswordHash,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.shop_by_email_mut(email).is_some_and(|entry| {
            entry.1 = hash.clone();
            entry.0.updated_at = Utc::now();
            true
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn replace(&self, secret: NewSecret) -> Result<VerificationSecret, RepositoryError> {
        let mut tables = self.tables.lock().await;

        let live = tables.secrets.values_mut().find(|s| {
            s.subject_email == secret.subject_email && s.kind == secret.kind && !s.is_consumed()
        });
        if let Some(existing) = live {
            existing.secret_hash = secret.secret_hash;
            existing.issued_at = secret.issued_at;
            existing.expires_at = secret.expires_at;
            return Ok(existing.clone());
        }

        let stored = VerificationSecret {
            id: SecretId::new(tables.next_id()),
            subject_email: secret.subject_email,
            kind: secret.kind,
            secret_hash: secret.secret_hash,
            issued_at: secret.issued_at,
            expires_at: secret.expires_at,
            consumed_at: None,
        };
        tables.secrets.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_unconsumed(
        &self,
        email: &Email,
        kind: SecretKind,
    ) -> Result<Option<VerificationSecret>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .secrets
            .values()
            .find(|s| &s.subject_email == email && s.kind == kind && !s.is_consumed())
            .cloned())
    }

    async fn consume(
        &self,
        id: SecretId,
        secret_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.secrets.get_mut(&id) {
            Some(secret) if !secret.is_consumed() && secret.secret_hash == secret_hash => {
                secret.consumed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl WarehouseStore for MemoryStore {
    async fn create(&self, warehouse: NewWarehouse) -> Result<Warehouse, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.shops.contains_key(&warehouse.shop_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let stored = Warehouse {
            id: WarehouseId::new(tables.next_id()),
            shop_id: warehouse.shop_id,
            name: warehouse.name,
            location: warehouse.location,
            capacity: warehouse.capacity,
            created_at: now,
            updated_at: now,
        };
        tables.warehouses.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> Result<Vec<Warehouse>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .warehouses
            .values()
            .filter(|w| w.shop_id == shop_id)
            .cloned()
            .collect())
    }

    async fn find_owned(
        &self,
        id: WarehouseId,
        shop_id: ShopId,
    ) -> Result<Option<Warehouse>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .warehouses
            .get(&id)
            .filter(|w| w.shop_id == shop_id)
            .cloned())
    }

    async fn delete_owned(
        &self,
        id: WarehouseId,
        shop_id: ShopId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.owns_warehouse(id, shop_id) {
            return Ok(false);
        }
        tables.warehouses.remove(&id);
        tables.items.retain(|_, item| item.warehouse_id != id);
        Ok(true)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_owned(
        &self,
        shop_id: ShopId,
        item: NewInventoryItem,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.owns_warehouse(item.warehouse_id, shop_id) {
            return Ok(None);
        }

        let now = Utc::now();
        let stored = InventoryItem {
            id: InventoryItemId::new(tables.next_id()),
            warehouse_id: item.warehouse_id,
            product_name: item.product_name,
            sku: item.sku,
            quantity: item.quantity,
            price: item.price,
            category: item.category,
            created_at: now,
            updated_at: now,
        };
        tables.items.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    async fn list_for_shop(
        &self,
        shop_id: ShopId,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|item| tables.owns_warehouse(item.warehouse_id, shop_id))
            .filter(|item| warehouse_id.is_none_or(|w| item.warehouse_id == w))
            .cloned()
            .collect())
    }

    async fn find_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.owned_item_mut(id, shop_id).map(|item| item.clone()))
    }

    async fn set_quantity_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        quantity: i32,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.owned_item_mut(id, shop_id).map(|item| {
            item.quantity = quantity;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn set_price_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        price: Price,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.owned_item_mut(id, shop_id).map(|item| {
            item.price = price;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn update_details_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
        update: ItemDetailsUpdate,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.owned_item_mut(id, shop_id).map(|item| {
            if let Some(name) = update.product_name {
                item.product_name = name;
            }
            if let Some(sku) = update.sku {
                item.sku = sku;
            }
            if let Some(category) = update.category {
                item.category = category;
            }
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete_owned(
        &self,
        id: InventoryItemId,
        shop_id: ShopId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.owned_item_mut(id, shop_id).is_none() {
            return Ok(false);
        }
        Ok(tables.items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn email(s: &str) -> Email {
        Email::parse(s).expect("valid email")
    }

    fn new_shop(addr: &str) -> NewShop {
        NewShop {
            name: "Corner Shop".to_string(),
            email: email(addr),
            phone: "555-0100".to_string(),
            address: "1 High St".to_string(),
            password_hash: PasswordHash::new("hash".to_string()),
        }
    }

    fn new_secret(addr: &str, hash: &str) -> NewSecret {
        let now = Utc::now();
        NewSecret {
            subject_email: email(addr),
            kind: SecretKind::Otp,
            secret_hash: hash.to_string(),
            issued_at: now,
            expires_at: now + TimeDelta::minutes(10),
        }
    }

    async fn shop_with_warehouse(store: &MemoryStore, addr: &str) -> (ShopId, WarehouseId) {
        let shop = ShopStore::create(store, new_shop(addr)).await.expect("shop");
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
        .expect("warehouse");
        (shop.id, warehouse.id)
    }

    fn new_item(warehouse_id: WarehouseId) -> NewInventoryItem {
        NewInventoryItem {
            warehouse_id,
            product_name: "Widget".to_string(),
            sku: "W-1".to_string(),
            quantity: 3,
            price: Price::ZERO,
            category: "parts".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        ShopStore::create(&store, new_shop("a@shop.com"))
            .await
            .expect("first");
        let err = ShopStore::create(&store, new_shop("A@Shop.com"))
            .await
            .expect_err("second");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_replace_supersedes_live_secret() {
        let store = MemoryStore::new();
        let first = store.replace(new_secret("a@shop.com", "h1")).await.expect("first");
        let second = store.replace(new_secret("a@shop.com", "h2")).await.expect("second");
        assert_eq!(first.id, second.id);

        let live = store
            .find_unconsumed(&email("a@shop.com"), SecretKind::Otp)
            .await
            .expect("lookup")
            .expect("live secret");
        assert_eq!(live.secret_hash, "h2");
        assert!(!store.consume(live.id, "h1", Utc::now()).await.expect("consume"));
    }

    #[tokio::test]
    async fn test_consume_succeeds_once() {
        let store = MemoryStore::new();
        let secret = store.replace(new_secret("a@shop.com", "h")).await.expect("issue");
        assert!(store.consume(secret.id, "h", Utc::now()).await.expect("first"));
        assert!(!store.consume(secret.id, "h", Utc::now()).await.expect("second"));
        assert!(
            store
                .find_unconsumed(&email("a@shop.com"), SecretKind::Otp)
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_issue_after_consume_creates_new_row() {
        let store = MemoryStore::new();
        let first = store.replace(new_secret("a@shop.com", "h1")).await.expect("first");
        store.consume(first.id, "h1", Utc::now()).await.expect("consume");
        let second = store.replace(new_secret("a@shop.com", "h2")).await.expect("second");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_other_shop_cannot_see_or_delete_warehouse() {
        let store = MemoryStore::new();
        let (owner, warehouse) = shop_with_warehouse(&store, "a@shop.com").await;
        let (intruder, _) = shop_with_warehouse(&store, "b@shop.com").await;

        assert!(WarehouseStore::find_owned(&store, warehouse, intruder).await.expect("find").is_none());
        assert!(!WarehouseStore::delete_owned(&store, warehouse, intruder).await.expect("delete"));
        assert!(WarehouseStore::find_owned(&store, warehouse, owner).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn test_item_in_foreign_warehouse_is_rejected() {
        let store = MemoryStore::new();
        let (_, warehouse) = shop_with_warehouse(&store, "a@shop.com").await;
        let (intruder, _) = shop_with_warehouse(&store, "b@shop.com").await;

        let created = store
            .create_owned(intruder, new_item(warehouse))
            .await
            .expect("create");
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_item_updates_are_owner_scoped() {
        let store = MemoryStore::new();
        let (owner, warehouse) = shop_with_warehouse(&store, "a@shop.com").await;
        let (intruder, _) = shop_with_warehouse(&store, "b@shop.com").await;
        let item = store
            .create_owned(owner, new_item(warehouse))
            .await
            .expect("create")
            .expect("owned warehouse");

        assert!(store.set_quantity_owned(item.id, intruder, 9).await.expect("update").is_none());
        let updated = store
            .set_quantity_owned(item.id, owner, 9)
            .await
            .expect("update")
            .expect("owned item");
        assert_eq!(updated.quantity, 9);
        assert!(!InventoryStore::delete_owned(&store, item.id, intruder).await.expect("delete"));
    }

    #[tokio::test]
    async fn test_deleting_warehouse_removes_its_items() {
        let store = MemoryStore::new();
        let (owner, warehouse) = shop_with_warehouse(&store, "a@shop.com").await;
        store
            .create_owned(owner, new_item(warehouse))
            .await
            .expect("create");

        assert!(WarehouseStore::delete_owned(&store, warehouse, owner).await.expect("delete"));
        let remaining = InventoryStore::list_for_shop(&store, owner, None)
            .await
            .expect("list");
        assert!(remaining.is_empty());
    }
}
