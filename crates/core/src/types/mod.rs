//! Core types for StockMate.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod secret;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use secret::SecretKind;
