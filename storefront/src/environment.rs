//! Dependencies injected into the storefront reducers.

use crate::catalog::Catalog;
use crate::config::StorefrontSettings;
use crate::payment::{MockPaymentGateway, PaymentGateway};
use keystore_core::environment::Clock;
use std::sync::Arc;

/// Environment dependencies for the storefront reducers
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Clock for timestamps and invoice expiry
    pub clock: Arc<dyn Clock>,
    /// Payment gateway charged at checkout
    pub payments: Arc<dyn PaymentGateway>,
    /// Read-only product catalog
    pub catalog: Arc<Catalog>,
    /// Simulated delays, credentials and merchant data
    pub settings: StorefrontSettings,
}

impl StorefrontEnvironment {
    /// Creates a new `StorefrontEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        payments: Arc<dyn PaymentGateway>,
        catalog: Arc<Catalog>,
        settings: StorefrontSettings,
    ) -> Self {
        Self {
            clock,
            payments,
            catalog,
            settings,
        }
    }

    /// Seeded catalog, an instant mock gateway and no simulated delays
    #[must_use]
    pub fn instant(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::clone(&clock),
            MockPaymentGateway::instant(clock).shared(),
            Arc::new(Catalog::seed()),
            StorefrontSettings::instant(),
        )
    }
}

impl std::fmt::Debug for StorefrontEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontEnvironment")
            .field("catalog", &self.catalog.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
