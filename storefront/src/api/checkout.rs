//! Checkout endpoints.
//!
//! - GET /api/v1/payment-methods - Methods with fee and payable total for the cart
//! - GET /api/v1/checkout - Checkout snapshot
//! - PUT /api/v1/checkout/details - Customer details, terms and payment method
//! - POST /api/v1/checkout/submit - Submit the cart as an order
//! - POST /api/v1/checkout/confirm - Pay, waiting for the gateway
//! - POST /api/v1/checkout/cancel - Abandon the payment
//! - POST /api/v1/checkout/reset - Start over after a completed order

#![allow(clippy::missing_errors_doc)]

use super::dispatch_and_settle;
use crate::app::StorefrontAction;
use crate::features::checkout::{
    CheckoutAction, CheckoutError, CheckoutPhase, CheckoutState, CustomerDetails,
};
use crate::payment::{CardDetails, PaymentMethod, PaymentReceipt};
use crate::server::state::AppState;
use crate::types::{Money, OrderId};
use axum::{extract::State, Json};
use keystore_web::{ApiJson, AppError, CorrelationId};
use serde::{Deserialize, Serialize};

/// A payment method as offered for the current cart
#[derive(Debug, Serialize)]
pub struct PaymentMethodView {
    /// Method id (`sbp`, `card`, ...)
    pub id: PaymentMethod,
    /// Display name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Commission in basis points
    pub fee_bps: u32,
    /// Highlighted in the method picker
    pub popular: bool,
    /// Commission on the current cart total
    pub fee: Money,
    /// Cart total plus commission
    pub total: Money,
}

/// Request body for the checkout form
#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    /// Customer details
    #[serde(flatten)]
    pub details: CustomerDetails,
    /// Terms of sale accepted
    #[serde(default)]
    pub agree_to_terms: bool,
    /// Payment method, unchanged when omitted
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Request body for paying the submitted order
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    /// Card details, for card payments
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// Successful payment
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    /// Gateway receipt
    pub receipt: PaymentReceipt,
    /// Order number recorded for the payment
    pub order_id: Option<OrderId>,
}

/// Maps a checkout rejection to an HTTP error
fn rejection(error: &CheckoutError) -> AppError {
    if error.is_conflict() {
        AppError::conflict(error.to_string())
    } else {
        AppError::validation(error.to_string())
    }
}

async fn snapshot(state: &AppState) -> CheckoutState {
    state.store.state(|s| s.checkout.clone()).await
}

/// Sends a synchronous checkout command and reports its rejection, if any
async fn apply(state: &AppState, action: StorefrontAction) -> Result<CheckoutState, AppError> {
    state.store.send(action).await?;
    let checkout = snapshot(state).await;
    if let Some(error) = &checkout.rejection {
        return Err(rejection(error));
    }
    Ok(checkout)
}

/// List payment methods priced against the current cart.
pub async fn list_payment_methods(State(state): State<AppState>) -> Json<Vec<PaymentMethodView>> {
    let subtotal = state.store.state(|s| s.cart.total()).await;

    Json(
        PaymentMethod::ALL
            .iter()
            .map(|&method| PaymentMethodView {
                id: method,
                name: method.name(),
                description: method.description(),
                fee_bps: method.fee_bps(),
                popular: method.is_popular(),
                fee: method.fee(subtotal),
                total: method.total_with_fee(subtotal),
            })
            .collect(),
    )
}

/// Get the checkout.
pub async fn get_checkout(State(state): State<AppState>) -> Json<CheckoutState> {
    Json(snapshot(&state).await)
}

/// Fill in the checkout form.
///
/// ```bash
/// curl -X PUT http://localhost:3000/api/v1/checkout/details \
///   -H "Content-Type: application/json" \
///   -d '{"email": "ivan@example.com", "first_name": "Иван", "last_name": "Петров",
///        "agree_to_terms": true, "payment_method": "sbp"}'
/// ```
pub async fn update_details(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateDetailsRequest>,
) -> Result<Json<CheckoutState>, AppError> {
    let mut checkout = apply(
        &state,
        CheckoutAction::UpdateDetails {
            details: request.details,
            agree_to_terms: request.agree_to_terms,
        }
        .into(),
    )
    .await?;

    if let Some(method) = request.payment_method {
        checkout = apply(&state, CheckoutAction::SelectPaymentMethod { method }.into()).await?;
    }

    Ok(Json(checkout))
}

/// Submit the cart as an order.
pub async fn submit(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> Result<Json<CheckoutState>, AppError> {
    tracing::info!(correlation_id = %correlation_id.0, "Submitting order");
    apply(&state, StorefrontAction::SubmitCheckout).await.map(Json)
}

/// Pay the submitted order.
///
/// Waits for the gateway. A declined payment answers `402` and leaves the
/// order awaiting payment so it can be retried.
pub async fn confirm(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    request: Option<ApiJson<ConfirmRequest>>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let ConfirmRequest { card } = request.map(|ApiJson(r)| r).unwrap_or_default();
    tracing::info!(correlation_id = %correlation_id.0, with_card = card.is_some(), "Confirming payment");

    let produced = dispatch_and_settle(
        &state.store,
        CheckoutAction::ConfirmPayment { card }.into(),
        state.action_timeout,
    )
    .await?;

    for action in produced {
        match action {
            StorefrontAction::Checkout(CheckoutAction::PaymentSucceeded { receipt }) => {
                let order_id = state
                    .store
                    .state(|s| match &s.checkout.phase {
                        CheckoutPhase::Completed {
                            receipt: completed,
                            order_id,
                            ..
                        } if completed.transaction_id == receipt.transaction_id => order_id.clone(),
                        _ => None,
                    })
                    .await;
                metrics::counter!("storefront.payments.total", "outcome" => "succeeded").increment(1);
                return Ok(Json(ConfirmResponse { receipt, order_id }));
            },
            StorefrontAction::Checkout(CheckoutAction::PaymentFailed { reason }) => {
                metrics::counter!("storefront.payments.total", "outcome" => "declined").increment(1);
                return Err(AppError::payment_declined(reason));
            },
            StorefrontAction::Checkout(CheckoutAction::PaymentRejected { error }) => {
                return Err(rejection(&error));
            },
            _ => {},
        }
    }

    Err(AppError::conflict("The payment was cancelled"))
}

/// Abandon the payment and go back to the form.
pub async fn cancel(State(state): State<AppState>) -> Result<Json<CheckoutState>, AppError> {
    apply(&state, CheckoutAction::CancelPayment.into()).await.map(Json)
}

/// Start over after a completed order.
pub async fn reset(State(state): State<AppState>) -> Result<Json<CheckoutState>, AppError> {
    apply(&state, CheckoutAction::Reset.into()).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentError;
    use axum::http::StatusCode;

    #[test]
    fn test_rejection_status_follows_the_error_kind() {
        assert_eq!(rejection(&CheckoutError::AlreadySubmitted).status(), StatusCode::CONFLICT);
        assert_eq!(rejection(&CheckoutError::InvoiceExpired).status(), StatusCode::CONFLICT);
        assert_eq!(rejection(&CheckoutError::NothingToCancel).status(), StatusCode::CONFLICT);
        assert_eq!(
            rejection(&CheckoutError::InvalidEmail).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            rejection(&CheckoutError::Payment(PaymentError::MissingCard)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_rejection_keeps_the_error_message() {
        let error = rejection(&CheckoutError::NotCompleted);
        assert_eq!(error.message(), CheckoutError::NotCompleted.to_string());
        assert_eq!(error.code(), "CONFLICT");
    }
}
