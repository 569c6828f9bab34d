//! Application state for the storefront HTTP server.

use crate::app::{StorefrontReducer, StorefrontState, StorefrontStore};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::environment::StorefrontEnvironment;
use crate::payment::MockPaymentGateway;
use axum::extract::FromRef;
use keystore_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// State shared across all HTTP handlers.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The storefront store, the only writer of storefront state
    pub store: Arc<StorefrontStore>,
    /// Product catalog
    pub catalog: Arc<Catalog>,
    /// How long a handler waits for the result of an asynchronous command
    /// (payment, sign-in, review publication)
    pub action_timeout: Duration,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(store: Arc<StorefrontStore>, catalog: Arc<Catalog>, action_timeout: Duration) -> Self {
        Self {
            store,
            catalog,
            action_timeout,
        }
    }

    /// Seeded storefront with the mock payment gateway and the system clock
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let catalog = Arc::new(Catalog::seed());
        let payments = MockPaymentGateway::new(config.payments.delays, Arc::clone(&clock)).shared();
        let environment = StorefrontEnvironment::new(
            clock,
            payments,
            Arc::clone(&catalog),
            config.storefront.clone(),
        );

        let store = StorefrontStore::with_config(
            StorefrontState::seed(),
            StorefrontReducer::new(),
            environment,
            config.store_config(),
        );

        Self::new(Arc::new(store), catalog, config.payments.confirm_timeout)
    }
}

// Lets the shared readiness handler extract the store
impl FromRef<AppState> for Arc<StorefrontStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}
