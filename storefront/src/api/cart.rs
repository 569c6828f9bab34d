//! Shopping cart endpoints.
//!
//! - GET /api/v1/cart - Cart snapshot
//! - POST /api/v1/cart/items - Add one unit of a product
//! - PUT /api/v1/cart/items/:id - Set a line's quantity (0 or less removes it)
//! - DELETE /api/v1/cart/items/:id - Remove a line
//! - DELETE /api/v1/cart - Empty the cart
//!
//! Every endpoint answers with the cart after the change.

#![allow(clippy::missing_errors_doc)]

use crate::features::cart::{CartAction, CartState};
use crate::server::state::AppState;
use crate::types::ProductId;
use axum::{
    extract::{Path, State},
    Json,
};
use keystore_web::{ApiJson, AppError, CorrelationId};
use serde::Deserialize;

/// Request body for adding a product
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Product to add
    pub product_id: ProductId,
}

/// Request body for changing a quantity
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    /// New quantity
    pub quantity: i64,
}

async fn snapshot(state: &AppState) -> CartState {
    state.store.state(|s| s.cart.clone()).await
}

async fn apply(state: &AppState, action: CartAction) -> Result<Json<CartState>, AppError> {
    state.store.send(action.into()).await?;
    Ok(Json(snapshot(state).await))
}

/// Get the cart.
pub async fn get_cart(State(state): State<AppState>) -> Json<CartState> {
    Json(snapshot(&state).await)
}

/// Add one unit of a catalog product.
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/cart/items \
///   -H "Content-Type: application/json" \
///   -d '{"product_id": 2}'
/// ```
pub async fn add_item(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> Result<Json<CartState>, AppError> {
    let product = state
        .catalog
        .get(request.product_id)
        .cloned()
        .ok_or_else(|| AppError::not_found("Product", request.product_id))?;

    tracing::debug!(correlation_id = %correlation_id.0, product_id = %product.id, "Adding to cart");
    apply(&state, CartAction::AddItem { product }).await
}

/// Set the quantity of a cart line.
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    ApiJson(request): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartState>, AppError> {
    apply(
        &state,
        CartAction::UpdateQuantity {
            id: ProductId::new(id),
            quantity: request.quantity,
        },
    )
    .await
}

/// Remove a cart line.
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<CartState>, AppError> {
    apply(&state, CartAction::RemoveItem { id: ProductId::new(id) }).await
}

/// Empty the cart.
pub async fn clear_cart(State(state): State<AppState>) -> Result<Json<CartState>, AppError> {
    apply(&state, CartAction::ClearCart).await
}
