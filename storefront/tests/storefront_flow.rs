//! Storefront flows driven through the `Store` runtime.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use keystore_runtime::{Store, StoreError};
use keystore_storefront::catalog::{Catalog, Product};
use keystore_storefront::config::StorefrontSettings;
use keystore_storefront::features::admin::OrderStatus;
use keystore_storefront::features::cart::CartAction;
use keystore_storefront::features::checkout::{CheckoutAction, CheckoutPhase, CustomerDetails};
use keystore_storefront::features::reviews::{NewReview, ReviewsAction};
use keystore_storefront::features::session::{Role, SessionAction};
use keystore_storefront::payment::{
    CardDetails, MockPaymentGateway, PaymentDelays, PaymentGateway, PaymentMethod,
};
use keystore_storefront::types::{Money, OrderId, ProductId};
use keystore_storefront::{StorefrontAction, StorefrontEnvironment, StorefrontReducer, StorefrontState, StorefrontStore};
use keystore_testing::test_clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const WAIT: Duration = Duration::from_secs(5);

fn store_with(payments: Arc<dyn PaymentGateway>) -> StorefrontStore {
    let env = StorefrontEnvironment::new(
        Arc::new(test_clock()),
        payments,
        Arc::new(Catalog::seed()),
        StorefrontSettings::instant(),
    );
    Store::new(StorefrontState::seed(), StorefrontReducer::new(), env)
}

fn store() -> StorefrontStore {
    store_with(MockPaymentGateway::instant(Arc::new(test_clock())).shared())
}

fn product(id: u32) -> Product {
    Catalog::seed().get(ProductId::new(id)).cloned().expect("seeded product")
}

fn details() -> StorefrontAction {
    CheckoutAction::UpdateDetails {
        details: CustomerDetails {
            email: "maria@example.com".to_string(),
            first_name: "Мария".to_string(),
            last_name: "Сидорова".to_string(),
            phone: String::new(),
        },
        agree_to_terms: true,
    }
    .into()
}

async fn send_and_settle(store: &StorefrontStore, action: StorefrontAction) {
    let mut handle = store.send(action).await.expect("store accepts actions");
    assert_ok!(handle.wait_with_timeout(WAIT).await);
}

async fn submit_order(store: &StorefrontStore, method: PaymentMethod, products: &[u32]) {
    for &id in products {
        send_and_settle(store, CartAction::AddItem { product: product(id) }.into()).await;
    }
    send_and_settle(store, details()).await;
    send_and_settle(store, CheckoutAction::SelectPaymentMethod { method }.into()).await;
    send_and_settle(store, StorefrontAction::SubmitCheckout).await;
}

fn card() -> CardDetails {
    CardDetails {
        number: "4111 1111 1111 1111".to_string(),
        expiry: "12/28".to_string(),
        cvv: "123".to_string(),
        holder: "MARIA SIDOROVA".to_string(),
    }
}

#[tokio::test]
async fn test_sbp_purchase_end_to_end() {
    let store = store();
    submit_order(&store, PaymentMethod::Sbp, &[2, 2]).await;

    send_and_settle(&store, CheckoutAction::ConfirmPayment { card: None }.into()).await;

    let state = store.state(Clone::clone).await;
    let CheckoutPhase::Completed { order, receipt, order_id } = &state.checkout.phase else {
        panic!("expected Completed, got {:?}", state.checkout.phase);
    };
    assert_eq!(order.amount, Money::from_minor(15980));
    assert!(receipt.transaction_id.starts_with("SBP_"));
    assert!(state.cart.is_empty());

    assert_eq!(order_id.as_ref(), Some(&OrderId::from_sequence(4)));
    let recorded = state.admin.order(&OrderId::from_sequence(4)).expect("recorded order");
    assert_eq!(recorded.status, OrderStatus::Paid);
    assert_eq!(recorded.lines[0].quantity, 2);
    assert_eq!(state.admin.stats().total_orders, 4);
}

#[tokio::test]
async fn test_card_purchase_adds_commission() {
    let store = store();
    submit_order(&store, PaymentMethod::Card, &[1]).await;

    send_and_settle(&store, CheckoutAction::ConfirmPayment { card: Some(card()) }.into()).await;

    let (phase, last_receipt) = store
        .state(|s| (s.checkout.phase.clone(), s.checkout.last_receipt.clone()))
        .await;
    assert!(matches!(phase, CheckoutPhase::Completed { .. }));
    let receipt = last_receipt.expect("receipt");
    // 4990 + 2.5%
    assert_eq!(receipt.amount, Money::from_minor(5115));
    assert_eq!(receipt.card.map(|c| c.last_four), Some("1111".to_string()));
}

#[tokio::test]
async fn test_declined_payment_can_be_retried() {
    let clock = Arc::new(test_clock());
    let store = store_with(MockPaymentGateway::instant(clock).declining("Insufficient funds").shared());
    submit_order(&store, PaymentMethod::Tinkoff, &[3]).await;

    let mut fed_back = store.subscribe_actions();
    send_and_settle(&store, CheckoutAction::ConfirmPayment { card: None }.into()).await;

    match fed_back.try_recv() {
        Ok(StorefrontAction::Checkout(CheckoutAction::PaymentFailed { reason })) => {
            assert_eq!(reason, "Payment declined: Insufficient funds");
        },
        other => panic!("expected PaymentFailed, got {other:?}"),
    }

    let state = store.state(Clone::clone).await;
    assert!(matches!(state.checkout.phase, CheckoutPhase::AwaitingConfirmation { .. }));
    assert_eq!(state.checkout.last_error.as_deref(), Some("Payment declined: Insufficient funds"));
    assert_eq!(state.cart.item_count(), 1);
    assert_eq!(state.admin.orders.len(), 3);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_payment() {
    let delays = PaymentDelays {
        sbp: Duration::from_secs(60),
        ..PaymentDelays::INSTANT
    };
    let store = store_with(MockPaymentGateway::new(delays, Arc::new(test_clock())).shared());
    submit_order(&store, PaymentMethod::Sbp, &[1]).await;

    let mut payment = store
        .send(CheckoutAction::ConfirmPayment { card: None }.into())
        .await
        .expect("confirm accepted");
    assert!(store.state(|s| s.checkout.phase.is_processing()).await);

    send_and_settle(&store, CheckoutAction::CancelPayment.into()).await;
    assert_ok!(payment.wait_with_timeout(WAIT).await);

    let state = store.state(Clone::clone).await;
    assert!(state.checkout.phase.is_editing());
    assert_eq!(state.cart.item_count(), 1);
    assert_eq!(state.admin.orders.len(), 3);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test]
async fn test_review_is_published_after_moderation() {
    let store = store();

    send_and_settle(
        &store,
        ReviewsAction::SubmitReview {
            review: NewReview {
                product_id: Some(ProductId::new(3)),
                name: "Ольга".to_string(),
                rating: 4,
                comment: "Активировалось без проблем".to_string(),
            },
        }
        .into(),
    )
    .await;

    let (newest, pending, summary) = store
        .state(|s| {
            (
                s.reviews.reviews(Some(ProductId::new(3))).first().map(|r| (*r).clone()),
                s.reviews.pending,
                s.reviews.summary(None),
            )
        })
        .await;
    let newest = newest.expect("published review");
    assert_eq!(newest.user_name, "Ольга");
    assert!(!newest.verified);
    assert_eq!(pending, 0);
    assert_eq!(summary.count, 7);
}

#[tokio::test]
async fn test_admin_login() {
    let store = store();

    let outcome = store
        .send_and_wait_for(
            SessionAction::Login {
                email: "admin@keystore.ru".to_string(),
                password: "admin".to_string(),
            }
            .into(),
            |a| matches!(a, StorefrontAction::Session(SessionAction::LoginSucceeded { .. })),
            WAIT,
        )
        .await;

    match outcome {
        Ok(StorefrontAction::Session(SessionAction::LoginSucceeded { user })) => {
            assert_eq!(user.role, Role::Admin);
        },
        other => panic!("expected LoginSucceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_rejects_actions_after_shutdown() {
    let store = store();

    assert_ok!(store.shutdown(Duration::from_secs(1)).await);

    let result = store.send(StorefrontAction::Cart(CartAction::ClearCart)).await;
    assert_err!(&result);
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
}
