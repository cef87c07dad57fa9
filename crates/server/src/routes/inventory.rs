//! Inventory route handlers. All routes require a bearer token.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use stockmate_core::{InventoryItemId, WarehouseId};

use crate::error::Result;
use crate::middleware::RequireShop;
use crate::models::InventoryItem;
use crate::services::inventory::{CreateItem, UpdateItemDetails};
use crate::state::AppState;

type ItemPath = std::result::Result<Path<InventoryItemId>, PathRejection>;

/// Query parameters for listing items.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub warehouse_id: Option<WarehouseId>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    pub price: Decimal,
}

/// POST /api/inventory
pub async fn create(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    payload: std::result::Result<Json<CreateItem>, JsonRejection>,
) -> Result<(StatusCode, Json<InventoryItem>)> {
    let Json(input) = payload?;
    let item = state.inventory().create(shop.id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/inventory?warehouse_id=
pub async fn list(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<InventoryItem>>> {
    let Query(query) = query?;
    let items = state.inventory().list(shop.id, query.warehouse_id).await?;
    Ok(Json(items))
}

/// GET /api/inventory/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: ItemPath,
) -> Result<Json<InventoryItem>> {
    let Path(id) = id?;
    Ok(Json(state.inventory().get(shop.id, id).await?))
}

/// PUT /api/inventory/{id}
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: ItemPath,
    payload: std::result::Result<Json<SetQuantityRequest>, JsonRejection>,
) -> Result<Json<InventoryItem>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let item = state
        .inventory()
        .set_quantity(shop.id, id, req.quantity)
        .await?;
    Ok(Json(item))
}

/// PATCH /api/inventory/{id}/price
pub async fn set_price(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: ItemPath,
    payload: std::result::Result<Json<SetPriceRequest>, JsonRejection>,
) -> Result<Json<InventoryItem>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let item = state.inventory().set_price(shop.id, id, req.price).await?;
    Ok(Json(item))
}

/// PATCH /api/inventory/{id}
pub async fn update_details(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: ItemPath,
    payload: std::result::Result<Json<UpdateItemDetails>, JsonRejection>,
) -> Result<Json<InventoryItem>> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let item = state.inventory().update_details(shop.id, id, input).await?;
    Ok(Json(item))
}

/// DELETE /api/inventory/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: ItemPath,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.inventory().delete(shop.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
