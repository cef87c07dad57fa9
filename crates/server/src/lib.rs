//! StockMate server library.
//!
//! Multi-tenant inventory ledger: shop accounts with OTP verification,
//! signed bearer sessions, password reset, and warehouse and inventory
//! records scoped to the owning shop. Exposed as a library so the binary,
//! the operator CLI and the integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
