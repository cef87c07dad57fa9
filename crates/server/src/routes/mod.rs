//! HTTP route handlers for the StockMate API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (probes the shop store)
//!
//! # Shop accounts
//! POST   /api/shop/register               - Register (201)
//! POST   /api/shop/verify-otp             - Confirm the emailed OTP
//! POST   /api/shop/resend-otp             - Send a fresh OTP
//! POST   /api/shop/login                  - Exchange credentials for a bearer token
//! GET    /api/shop/profile                - Authenticated shop (requires auth)
//! POST   /api/shop/forgot-password        - Email a reset link
//! POST   /api/shop/reset-password/{token} - Set a new password
//!
//! # Warehouses (requires auth)
//! POST   /api/warehouse                   - Create (201)
//! GET    /api/warehouse                   - List own
//! GET    /api/warehouse/{id}              - Fetch own
//! DELETE /api/warehouse/{id}              - Delete own, with its inventory
//!
//! # Inventory (requires auth)
//! POST   /api/inventory                   - Create in an own warehouse (201)
//! GET    /api/inventory?warehouse_id=     - List own
//! GET    /api/inventory/{id}              - Fetch own
//! PUT    /api/inventory/{id}              - Set quantity
//! PATCH  /api/inventory/{id}              - Update name, SKU or category
//! PATCH  /api/inventory/{id}/price        - Set price
//! DELETE /api/inventory/{id}              - Delete own
//! ```

pub mod inventory;
pub mod shop;
pub mod warehouse;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, patch, post},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Body for endpoints that only acknowledge success.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the shop account routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(shop::register))
        .route("/verify-otp", post(shop::verify_otp))
        .route("/resend-otp", post(shop::resend_otp))
        .route("/login", post(shop::login))
        .route("/profile", get(shop::profile))
        .route("/forgot-password", post(shop::forgot_password))
        .route("/reset-password/{token}", post(shop::reset_password))
}

/// Create the warehouse routes router.
pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(warehouse::create).get(warehouse::list))
        .route("/{id}", get(warehouse::show).delete(warehouse::delete))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(inventory::create).get(inventory::list))
        .route(
            "/{id}",
            get(inventory::show)
                .put(inventory::set_quantity)
                .patch(inventory::update_details)
                .delete(inventory::delete),
        )
        .route("/{id}/price", patch(inventory::set_price))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/shop", shop_routes())
        .nest("/api/warehouse", warehouse_routes())
        .nest("/api/inventory", inventory_routes())
}

/// The complete application: health checks, API routes, request IDs and
/// request tracing, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        shop_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the shop store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.stores().shops.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
