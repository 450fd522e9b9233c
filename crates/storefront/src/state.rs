//! Application state shared across handlers.

use std::sync::Arc;

use crate::clients::{AuthClient, CatalogClient, OrderClient};
use crate::config::StorefrontConfig;
use crate::services::session::RetryPolicy;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the three remote service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    auth: AuthClient,
    catalog: CatalogClient,
    orders: OrderClient,
    oauth_retry: RetryPolicy,
}

impl AppState {
    /// Create a new application state with the default third-party
    /// profile-fetch retry schedule.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self::with_retry_policy(config, RetryPolicy::default())
    }

    /// Create application state with an explicit retry schedule. Tests use
    /// this to shrink the backoff waits.
    #[must_use]
    pub fn with_retry_policy(config: StorefrontConfig, oauth_retry: RetryPolicy) -> Self {
        let auth = AuthClient::new(&config.services.auth);
        let catalog = CatalogClient::new(&config.services.catalog);
        let orders = OrderClient::new(&config.services.orders);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                catalog,
                orders,
                oauth_retry,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the authentication service client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the catalog service client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the order service client.
    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }

    /// Retry schedule for the third-party profile fetch.
    #[must_use]
    pub fn oauth_retry(&self) -> RetryPolicy {
        self.inner.oauth_retry
    }
}
