//! Admin panel endpoints. All of them require an administrator session.
//!
//! - GET /api/v1/admin/stats - Dashboard figures
//! - GET /api/v1/admin/orders - All orders
//! - GET /api/v1/admin/keys - Key inventory
//! - POST /api/v1/admin/keys - Add a key
//! - DELETE /api/v1/admin/keys/:id - Delete a key
//! - PUT /api/v1/admin/orders/:id/status - Change an order's status
//! - POST /api/v1/admin/orders/:id/assign-keys - Send keys for an order

#![allow(clippy::missing_errors_doc)]

use super::session::require_admin;
use crate::features::admin::{AdminAction, AdminStats, LicenseKey, Order, OrderStatus};
use crate::server::state::AppState;
use crate::types::{KeyId, OrderId, ProductId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use keystore_web::{ApiJson, AppError};
use serde::Deserialize;

/// Request body for adding a key
#[derive(Debug, Deserialize)]
pub struct AddKeyRequest {
    /// Product the key activates
    pub product_id: ProductId,
    /// The key
    pub key: String,
}

/// Request body for changing an order's status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status
    pub status: OrderStatus,
}

/// Sends an admin command and reports its rejection, if any
async fn apply(state: &AppState, action: AdminAction) -> Result<(), AppError> {
    state.store.send(action.into()).await?;
    match state.store.state(|s| s.admin.last_error.clone()).await {
        Some(message) => Err(AppError::conflict(message)),
        None => Ok(()),
    }
}

async fn order(state: &AppState, id: &OrderId) -> Result<Order, AppError> {
    state
        .store
        .state(|s| s.admin.order(id).cloned())
        .await
        .ok_or_else(|| AppError::not_found("Order", id))
}

/// Dashboard figures.
pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    require_admin(&state).await?;
    Ok(Json(state.store.state(|s| s.admin.stats()).await))
}

/// All orders, oldest first.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    require_admin(&state).await?;
    Ok(Json(state.store.state(|s| s.admin.orders.clone()).await))
}

/// Key inventory.
pub async fn list_keys(State(state): State<AppState>) -> Result<Json<Vec<LicenseKey>>, AppError> {
    require_admin(&state).await?;
    Ok(Json(state.store.state(|s| s.admin.keys.clone()).await))
}

/// Add a license key.
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/admin/keys \
///   -H "Content-Type: application/json" \
///   -d '{"product_id": 1, "key": "AAAAA-11111-22222-33333-44444"}'
/// ```
pub async fn add_key(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddKeyRequest>,
) -> Result<(StatusCode, Json<LicenseKey>), AppError> {
    require_admin(&state).await?;

    if state.catalog.get(request.product_id).is_none() {
        return Err(AppError::not_found("Product", request.product_id));
    }
    let key = request.key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::validation("License key must not be empty"));
    }

    apply(
        &state,
        AdminAction::AddKey {
            product_id: request.product_id,
            key: key.clone(),
        },
    )
    .await?;

    state
        .store
        .state(|s| s.admin.keys.iter().rev().find(|k| k.key == key).cloned())
        .await
        .map(|added| (StatusCode::CREATED, Json(added)))
        .ok_or_else(|| AppError::internal("The key was not stored"))
}

/// Delete a license key.
pub async fn delete_key(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode, AppError> {
    require_admin(&state).await?;

    let id = KeyId::new(id);
    if state.store.state(|s| s.admin.key(id).is_none()).await {
        return Err(AppError::not_found("License key", id));
    }

    apply(&state, AdminAction::DeleteKey { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change an order's status.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    require_admin(&state).await?;

    let id = OrderId::new(id);
    order(&state, &id).await?;
    apply(
        &state,
        AdminAction::UpdateOrderStatus {
            order_id: id.clone(),
            status: request.status,
        },
    )
    .await?;
    order(&state, &id).await.map(Json)
}

/// Assign unused keys to an order and mark it delivered.
///
/// All-or-nothing: `409` when any product is short of keys.
pub async fn assign_keys(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>, AppError> {
    require_admin(&state).await?;

    let id = OrderId::new(id);
    order(&state, &id).await?;
    apply(&state, AdminAction::AssignKeys { order_id: id.clone() }).await?;
    order(&state, &id).await.map(Json)
}
