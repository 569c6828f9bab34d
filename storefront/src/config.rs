//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::payment::PaymentDelays;
use keystore_runtime::StoreConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Store runtime configuration
    pub store: StoreSettings,
    /// Mock payment gateway configuration
    pub payments: PaymentConfig,
    /// Domain settings handed to the reducers
    pub storefront: StorefrontSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    pub host: String,
    /// Port (default: 3000)
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// How long to wait for in-flight effects on shutdown
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Store runtime configuration
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Capacity of the effect action broadcast channel
    pub broadcast_capacity: usize,
}

/// Mock payment gateway configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Simulated processing time per method
    pub delays: PaymentDelays,
    /// How long `/checkout/confirm` waits for the gateway
    pub confirm_timeout: Duration,
}

/// Settings the storefront reducers read from their environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontSettings {
    /// Simulated sign-in latency
    pub login_delay: Duration,
    /// Simulated review moderation latency
    pub review_delay: Duration,
    /// How long an SBP QR invoice can be paid
    pub qr_validity: Duration,
    /// Merchant name embedded in QR invoices
    pub merchant_name: String,
    /// Admin account email
    pub admin_email: String,
    /// Admin account password
    pub admin_password: String,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            login_delay: Duration::from_millis(1000),
            review_delay: Duration::from_millis(1000),
            qr_validity: Duration::from_secs(900),
            merchant_name: "KeyStore".to_string(),
            admin_email: "admin@keystore.ru".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

impl StorefrontSettings {
    /// Settings with every simulated delay removed, for tests
    #[must_use]
    pub fn instant() -> Self {
        Self {
            login_delay: Duration::ZERO,
            review_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Falls back to defaults for any missing or unparsable variable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = StorefrontSettings::default();

        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("PORT", 3000),
                log_level: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "keystore=info,tower_http=info".to_string()),
                shutdown_timeout: Duration::from_secs(parse_env("SHUTDOWN_TIMEOUT_SECS", 30)),
            },
            store: StoreSettings {
                broadcast_capacity: parse_env("STORE_BROADCAST_CAPACITY", 64),
            },
            payments: PaymentConfig {
                delays: PaymentDelays {
                    sbp: Duration::from_millis(parse_env("PAYMENT_SBP_DELAY_MS", 5000)),
                    card: Duration::from_millis(parse_env("PAYMENT_CARD_DELAY_MS", 3000)),
                    default: Duration::from_millis(parse_env("PAYMENT_DEFAULT_DELAY_MS", 2000)),
                },
                confirm_timeout: Duration::from_secs(parse_env("PAYMENT_CONFIRM_TIMEOUT_SECS", 30)),
            },
            storefront: StorefrontSettings {
                login_delay: Duration::from_millis(parse_env("LOGIN_DELAY_MS", 1000)),
                review_delay: Duration::from_millis(parse_env("REVIEW_DELAY_MS", 1000)),
                qr_validity: Duration::from_secs(u64::from(parse_env::<u32>("QR_VALIDITY_SECS", 900))),
                merchant_name: env::var("MERCHANT_NAME").unwrap_or(defaults.merchant_name),
                admin_email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
                admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            },
        }
    }

    /// Runtime configuration for the [`Store`](keystore_runtime::Store)
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.store.broadcast_capacity.max(1))
            .with_shutdown_timeout(self.server.shutdown_timeout)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
