//! HTTP API handlers, one module per storefront feature.
//!
//! Handlers turn requests into [`StorefrontAction`]s, dispatch them through
//! the store and answer with a state snapshot or with the action an effect
//! fed back.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod reviews;
pub mod session;

use crate::app::{StorefrontAction, StorefrontStore};
use keystore_web::AppError;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

/// Sends `action` and waits until every effect it started has finished
///
/// Returns the actions those effects fed back, in the order they were
/// produced. By the time this returns they have all been reduced.
///
/// Cancelled effects finish without feeding anything back.
pub(crate) async fn dispatch_and_settle(
    store: &StorefrontStore,
    action: StorefrontAction,
    timeout: Duration,
) -> Result<Vec<StorefrontAction>, AppError> {
    let mut rx = store.subscribe_actions();
    let mut handle = store.send(action).await?;
    handle.wait_with_timeout(timeout).await?;

    let mut produced = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(action) => produced.push(action),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Missed fed-back actions");
            },
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    Ok(produced)
}
