//! Warehouse route handlers. All routes require a bearer token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use stockmate_core::WarehouseId;

use crate::error::Result;
use crate::middleware::RequireShop;
use crate::models::Warehouse;
use crate::services::warehouses::CreateWarehouse;
use crate::state::AppState;

/// POST /api/warehouse
pub async fn create(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    payload: std::result::Result<Json<CreateWarehouse>, JsonRejection>,
) -> Result<(StatusCode, Json<Warehouse>)> {
    let Json(input) = payload?;
    let warehouse = state.warehouses().create(shop.id, input).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

/// GET /api/warehouse
pub async fn list(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
) -> Result<Json<Vec<Warehouse>>> {
    Ok(Json(state.warehouses().list(shop.id).await?))
}

/// GET /api/warehouse/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: std::result::Result<Path<WarehouseId>, PathRejection>,
) -> Result<Json<Warehouse>> {
    let Path(id) = id?;
    Ok(Json(state.warehouses().get(shop.id, id).await?))
}

/// DELETE /api/warehouse/{id}
///
/// Removes the warehouse's inventory with it.
pub async fn delete(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    id: std::result::Result<Path<WarehouseId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.warehouses().delete(shop.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
