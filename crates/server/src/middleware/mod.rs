//! HTTP middleware for the StockMate API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor rather than a layer: protected handlers
//! take a [`RequireShop`] argument.

pub mod auth;
pub mod request_id;

pub use auth::RequireShop;
pub use request_id::request_id_middleware;
