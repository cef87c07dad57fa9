//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Stores;
use crate::services::auth::{AccountService, CredentialStore, SecretManager, SessionSigner};
use crate::services::clock::Clock;
use crate::services::email::Notifier;
use crate::services::{InventoryService, WarehouseService};

/// Error assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid session signing key: {0}")]
    SigningKey(#[from] hmac::digest::InvalidLength),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the stores, and the services built on them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    stores: Stores,
    accounts: AccountService,
    warehouses: WarehouseService,
    inventory: InventoryService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `stores` - Storage backends (`PostgreSQL` or in-memory)
    /// * `notifier` - Outbound notification channel
    /// * `clock` - Time source for secret and session expiry
    ///
    /// # Errors
    ///
    /// Returns an error if the session signing key is rejected.
    pub fn new(
        config: ServerConfig,
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StateError> {
        let sessions = SessionSigner::new(&config.session_secret, clock.clone())?;
        let accounts = AccountService::new(
            CredentialStore::new(stores.shops.clone()),
            SecretManager::new(stores.secrets.clone(), clock),
            sessions,
            notifier,
            config.base_url.clone(),
            config.require_verified_login,
        );
        let warehouses = WarehouseService::new(stores.warehouses.clone());
        let inventory = InventoryService::new(stores.inventory.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                accounts,
                warehouses,
                inventory,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backends.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Registration, verification, login and password reset.
    #[must_use]
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    #[must_use]
    pub fn warehouses(&self) -> &WarehouseService {
        &self.inner.warehouses
    }

    #[must_use]
    pub fn inventory(&self) -> &InventoryService {
        &self.inner.inventory
    }
}
