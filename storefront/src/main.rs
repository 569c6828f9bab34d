//! KeyStore storefront server
//!
//! ```bash
//! cargo run --bin keystore
//! curl http://localhost:3000/api/v1/products
//! ```

use anyhow::Context;
use keystore_storefront::{build_router, AppState, Config};
use keystore_web::shutdown_signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        address = %config.server.bind_address(),
        merchant = %config.storefront.merchant_name,
        "Starting KeyStore storefront"
    );

    let state = AppState::from_config(&config);
    let store = state.store.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address()))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("HTTP server stopped, draining effects");
    if let Err(error) = store.shutdown(config.server.shutdown_timeout).await {
        tracing::warn!(%error, "Store shutdown incomplete");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
