//! Axum web framework integration for KeyStore.
//!
//! This crate is the imperative shell around the storefront reducers:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON
//! │  - Request parsing                      │  ← Correlation IDs
//! │  - Response serialization               │  ← Logging, metrics
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Reducers (cart, checkout, ...)       │  ← No I/O, no side effects
//! │  - Effect descriptions (values)         │  ← Executed by the Store
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON, path, query)
//! 3. **Build Action** from extracted data
//! 4. **Dispatch** the action through the `Store`
//! 5. **Map result** (a state snapshot or a fed-back action) to a response
//!
//! # Example
//!
//! ```ignore
//! use keystore_web::{AppError, ApiJson};
//! use axum::{extract::State, Json};
//!
//! async fn add_item(
//!     State(state): State<AppState>,
//!     ApiJson(request): ApiJson<AddItemRequest>,
//! ) -> Result<Json<CartView>, AppError> {
//!     state.store.send(CartAction::AddItem { product }.into()).await?;
//!     Ok(Json(state.cart_view().await))
//! }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, CorrelationId};
pub use middleware::{correlation_id_layer, shutdown_signal, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
