//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::{MenuClient, RateClient, ReceiptClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the configuration and the
/// three external-collaborator clients. The cart itself lives in the session,
/// not here: there is no cross-session shared order state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    menu: MenuClient,
    rates: RateClient,
    receipts: ReceiptClient,
}

impl AppState {
    /// Create a new application state from the loaded configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let menu = MenuClient::new(&config.menu_csv_url);
        let rates = RateClient::new(&config.conversion_api_url);
        let receipts = ReceiptClient::new(&config.cloudinary);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                menu,
                rates,
                receipts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the menu catalog client.
    #[must_use]
    pub fn menu(&self) -> &MenuClient {
        &self.inner.menu
    }

    /// Get a reference to the conversion rate client.
    #[must_use]
    pub fn rates(&self) -> &RateClient {
        &self.inner.rates
    }

    /// Get a reference to the receipt upload client.
    #[must_use]
    pub fn receipts(&self) -> &ReceiptClient {
        &self.inner.receipts
    }
}
