//! Checkout flow.
//!
//! ```text
//! Editing ──Submit──▶ AwaitingConfirmation ──ConfirmPayment──▶ Processing
//!    ▲                    │        ▲                               │
//!    └───CancelPayment────┘        └─────────PaymentFailed─────────┤
//!                                                                  ▼
//!    ◀──────────────────────────Reset─────────────────────── Completed
//! ```
//!
//! The payment itself runs as a cancellable effect against the
//! [`PaymentGateway`](crate::payment::PaymentGateway) in the environment.
//! Rejected commands never fail the reducer: the reason is recorded in
//! `last_error` and the rest of the state is left as it was.

use crate::environment::StorefrontEnvironment;
use crate::features::cart::CartState;
use crate::payment::{CardDetails, PaymentError, PaymentMethod, PaymentReceipt, PaymentRequest, QrInvoice};
use crate::types::{Money, OrderId, ProductId};
use keystore_core::effect::{Effect, EffectId};
use keystore_core::environment::Clock;
use keystore_core::{async_effect, cancellable, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cancellation id of the in-flight payment effect
pub const PAYMENT_EFFECT_ID: &str = "checkout-payment";

/// Checkout validation errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CheckoutError {
    /// Terms of sale not accepted
    #[error("You must accept the terms of sale")]
    TermsNotAccepted,
    /// Email missing or malformed
    #[error("A valid email address is required")]
    InvalidEmail,
    /// First or last name missing
    #[error("First and last name are required")]
    MissingName,
    /// Nothing to buy
    #[error("The cart is empty")]
    EmptyOrder,
    /// Details are frozen once the order is submitted
    #[error("The order has already been submitted")]
    AlreadySubmitted,
    /// No order waiting for payment
    #[error("No order is awaiting payment")]
    NotAwaitingConfirmation,
    /// SBP invoice expired before payment
    #[error("The QR code has expired, submit the order again")]
    InvoiceExpired,
    /// Nothing in progress to cancel
    #[error("There is no payment to cancel")]
    NothingToCancel,
    /// `Reset` before the order completed
    #[error("The order has not been completed")]
    NotCompleted,
    /// Payment details rejected
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl CheckoutError {
    /// Checks if the command clashed with the checkout's progress rather
    /// than with its input
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadySubmitted
                | Self::NotAwaitingConfirmation
                | Self::InvoiceExpired
                | Self::NothingToCancel
                | Self::NotCompleted
        )
    }
}

// ============================================================================
// Orders
// ============================================================================

/// A purchased product line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product id
    pub product_id: ProductId,
    /// Product title
    pub title: String,
    /// Unit price
    pub unit_price: Money,
    /// Units bought
    pub quantity: u32,
}

impl OrderLine {
    /// `unit_price × quantity`
    #[must_use]
    pub const fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Snapshot of the cart taken when the order is submitted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Lines in cart order
    pub lines: Vec<OrderLine>,
    /// Total units
    pub item_count: u64,
    /// Sum of line totals, before the payment commission
    pub subtotal: Money,
}

impl OrderSummary {
    /// Reads the lines and totals out of the cart
    #[must_use]
    pub fn from_cart(cart: &CartState) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.id,
                    title: item.title.clone(),
                    unit_price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: cart.total(),
        }
    }

    /// Checks if the order has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Customer contact details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Email the keys are sent to
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Phone number (optional)
    #[serde(default)]
    pub phone: String,
}

impl CustomerDetails {
    /// `first_name last_name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A submitted order with its payable amount
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// What is being bought
    pub summary: OrderSummary,
    /// Who is buying it
    pub customer: CustomerDetails,
    /// How it will be paid
    pub method: PaymentMethod,
    /// Payment commission
    pub fee: Money,
    /// Subtotal plus commission
    pub amount: Money,
}

// ============================================================================
// State
// ============================================================================

/// Where the checkout currently is
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// Filling in the form
    #[default]
    Editing,
    /// Submitted, waiting for the customer to pay
    AwaitingConfirmation {
        /// The submitted order
        order: PendingOrder,
        /// QR invoice, for SBP payments
        invoice: Option<QrInvoice>,
    },
    /// Payment running at the gateway
    Processing {
        /// The order being paid
        order: PendingOrder,
        /// QR invoice, for SBP payments
        invoice: Option<QrInvoice>,
    },
    /// Paid
    Completed {
        /// The paid order
        order: PendingOrder,
        /// Gateway receipt
        receipt: PaymentReceipt,
        /// Order number recorded for the payment
        order_id: Option<OrderId>,
    },
}

impl CheckoutPhase {
    /// Checks if the form can still be edited
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing)
    }

    /// Checks if a payment is running
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }
}

/// Checkout form and progress
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckoutState {
    /// Customer details
    pub details: CustomerDetails,
    /// Selected payment method
    pub payment_method: PaymentMethod,
    /// Terms of sale accepted
    pub agree_to_terms: bool,
    /// Current phase
    pub phase: CheckoutPhase,
    /// Reason the last command was rejected, or the last payment failed
    pub last_error: Option<String>,
    /// The rejection behind `last_error`, when a command was rejected
    #[serde(skip)]
    pub rejection: Option<CheckoutError>,
    /// Receipt of the most recent successful payment
    pub last_receipt: Option<PaymentReceipt>,
}

impl CheckoutState {
    fn clear_error(&mut self) {
        self.last_error = None;
        self.rejection = None;
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Checkout actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutAction {
    // Commands
    /// Replace the customer details
    UpdateDetails {
        /// New details
        details: CustomerDetails,
        /// Terms of sale accepted
        agree_to_terms: bool,
    },
    /// Choose how to pay
    SelectPaymentMethod {
        /// Payment method
        method: PaymentMethod,
    },
    /// Submit the order built from the cart
    Submit {
        /// Order snapshot
        order: OrderSummary,
    },
    /// Pay the submitted order
    ConfirmPayment {
        /// Card details, required for card payments
        card: Option<CardDetails>,
    },
    /// Abandon the payment and go back to the form
    CancelPayment,
    /// Start over after a completed order
    Reset,

    // Events
    /// The gateway approved the payment
    PaymentSucceeded {
        /// Gateway receipt
        receipt: PaymentReceipt,
    },
    /// The gateway rejected the payment
    PaymentFailed {
        /// Failure reason
        reason: String,
    },
    /// `ConfirmPayment` was rejected before reaching the gateway
    PaymentRejected {
        /// Rejection reason
        error: CheckoutError,
    },
}

// ============================================================================
// Validation
// ============================================================================

/// Checks that an order can be submitted
///
/// # Errors
///
/// The first failing rule, checked in this order: terms, email, names, order.
pub fn validate_submission(
    details: &CustomerDetails,
    agree_to_terms: bool,
    order: &OrderSummary,
) -> Result<(), CheckoutError> {
    if !agree_to_terms {
        return Err(CheckoutError::TermsNotAccepted);
    }
    let email = details.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(CheckoutError::InvalidEmail);
    }
    if details.first_name.trim().is_empty() || details.last_name.trim().is_empty() {
        return Err(CheckoutError::MissingName);
    }
    if order.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    Ok(())
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the checkout flow
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(state: &mut CheckoutState, error: &CheckoutError) {
        tracing::warn!(%error, "Checkout command rejected");
        state.last_error = Some(error.to_string());
        state.rejection = Some(error.clone());
    }

    fn confirm_payment(
        state: &mut CheckoutState,
        card: Option<CardDetails>,
        env: &StorefrontEnvironment,
    ) -> Result<Effect<CheckoutAction>, CheckoutError> {
        let CheckoutPhase::AwaitingConfirmation { order, invoice } = &state.phase else {
            return Err(CheckoutError::NotAwaitingConfirmation);
        };

        if invoice.as_ref().is_some_and(|i| i.is_expired(env.clock.now())) {
            state.phase = CheckoutPhase::Editing;
            return Err(CheckoutError::InvoiceExpired);
        }

        let card = if order.method.requires_card() {
            let card = card.ok_or(PaymentError::MissingCard)?;
            card.validate()?;
            Some(card)
        } else {
            None
        };

        let request = PaymentRequest {
            method: order.method,
            amount: order.amount,
            card,
        };

        if let CheckoutPhase::AwaitingConfirmation { order, invoice } = std::mem::take(&mut state.phase) {
            tracing::info!(method = %order.method, amount = order.amount.minor(), "Payment started");
            state.phase = CheckoutPhase::Processing { order, invoice };
        }
        state.clear_error();

        let gateway = Arc::clone(&env.payments);
        Ok(cancellable! {
            id: PAYMENT_EFFECT_ID,
            effect: async_effect! {
                match gateway.charge(request).await {
                    Ok(receipt) => Some(CheckoutAction::PaymentSucceeded { receipt }),
                    Err(error) => Some(CheckoutAction::PaymentFailed { reason: error.to_string() }),
                }
            }
        })
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = StorefrontEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CheckoutAction::UpdateDetails {
                details,
                agree_to_terms,
            } => {
                if !state.phase.is_editing() {
                    Self::reject(state, &CheckoutError::AlreadySubmitted);
                    return SmallVec::new();
                }
                state.details = details;
                state.agree_to_terms = agree_to_terms;
                state.clear_error();
            },

            CheckoutAction::SelectPaymentMethod { method } => {
                if !state.phase.is_editing() {
                    Self::reject(state, &CheckoutError::AlreadySubmitted);
                    return SmallVec::new();
                }
                state.payment_method = method;
                state.clear_error();
            },

            CheckoutAction::Submit { order } => {
                if !state.phase.is_editing() {
                    Self::reject(state, &CheckoutError::AlreadySubmitted);
                    return SmallVec::new();
                }
                if let Err(error) = validate_submission(&state.details, state.agree_to_terms, &order) {
                    Self::reject(state, &error);
                    return SmallVec::new();
                }

                let method = state.payment_method;
                let fee = method.fee(order.subtotal);
                let amount = order.subtotal.saturating_add(fee);
                let invoice = (method == PaymentMethod::Sbp).then(|| {
                    QrInvoice::issue(
                        amount,
                        &env.settings.merchant_name,
                        env.clock.now(),
                        env.settings.qr_validity,
                    )
                });

                tracing::info!(
                    %method,
                    items = order.item_count,
                    amount = amount.minor(),
                    "Order submitted"
                );

                state.phase = CheckoutPhase::AwaitingConfirmation {
                    order: PendingOrder {
                        summary: order,
                        customer: state.details.clone(),
                        method,
                        fee,
                        amount,
                    },
                    invoice,
                };
                state.clear_error();
            },

            CheckoutAction::ConfirmPayment { card } => {
                return match Self::confirm_payment(state, card, env) {
                    Ok(effect) => smallvec![effect],
                    Err(error) => {
                        Self::reject(state, &error);
                        smallvec![async_effect! {
                            Some(CheckoutAction::PaymentRejected { error })
                        }]
                    },
                };
            },

            CheckoutAction::CancelPayment => match std::mem::take(&mut state.phase) {
                CheckoutPhase::AwaitingConfirmation { .. } | CheckoutPhase::Processing { .. } => {
                    tracing::info!("Payment cancelled");
                    state.clear_error();
                    return smallvec![Effect::Cancel(EffectId::new(PAYMENT_EFFECT_ID))];
                },
                other => {
                    state.phase = other;
                    Self::reject(state, &CheckoutError::NothingToCancel);
                },
            },

            CheckoutAction::Reset => {
                if !matches!(state.phase, CheckoutPhase::Completed { .. }) {
                    Self::reject(state, &CheckoutError::NotCompleted);
                    return SmallVec::new();
                }
                *state = CheckoutState {
                    last_receipt: state.last_receipt.take(),
                    ..CheckoutState::default()
                };
            },

            CheckoutAction::PaymentSucceeded { receipt } => match std::mem::take(&mut state.phase) {
                CheckoutPhase::Processing { order, .. } => {
                    tracing::info!(transaction_id = %receipt.transaction_id, "Payment succeeded");
                    state.last_receipt = Some(receipt.clone());
                    state.phase = CheckoutPhase::Completed {
                        order,
                        receipt,
                        order_id: None,
                    };
                    state.clear_error();
                },
                other => {
                    tracing::warn!(transaction_id = %receipt.transaction_id, "Ignoring payment result outside processing");
                    state.phase = other;
                },
            },

            CheckoutAction::PaymentFailed { reason } => match std::mem::take(&mut state.phase) {
                CheckoutPhase::Processing { order, invoice } => {
                    tracing::warn!(%reason, "Payment failed");
                    state.phase = CheckoutPhase::AwaitingConfirmation { order, invoice };
                    state.last_error = Some(reason);
                    state.rejection = None;
                },
                other => {
                    tracing::warn!(%reason, "Ignoring payment failure outside processing");
                    state.phase = other;
                },
            },

            // Already recorded when the command was rejected
            CheckoutAction::PaymentRejected { .. } => {},
        }

        SmallVec::new()
    }
}
