//! Root state, actions and reducer of the storefront.
//!
//! Each feature reducer is scoped onto its slice of [`StorefrontState`] and
//! the scoped reducers are combined. [`StorefrontReducer`] adds the glue
//! between features: submitting the checkout reads the cart, and a confirmed
//! payment empties the cart and records the order for the admin panel.

use crate::environment::StorefrontEnvironment;
use crate::features::admin::{AdminAction, AdminReducer, AdminState};
use crate::features::cart::{CartAction, CartReducer, CartState};
use crate::features::checkout::{
    CheckoutAction, CheckoutPhase, CheckoutReducer, CheckoutState, OrderSummary,
};
use crate::features::reviews::{ReviewsAction, ReviewsReducer, ReviewsState};
use crate::features::session::{SessionAction, SessionReducer, SessionState};
use keystore_core::composition::{combine_reducers, scope, CombinedReducer};
use keystore_core::effect::Effect;
use keystore_core::{reducer::Reducer, SmallVec};
use keystore_runtime::Store;
use serde::{Deserialize, Serialize};

/// Store type used by the server and the HTTP handlers
pub type StorefrontStore = Store<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>;

/// The whole storefront session
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StorefrontState {
    /// Shopping cart
    pub cart: CartState,
    /// Checkout form and progress
    pub checkout: CheckoutState,
    /// Customer reviews
    pub reviews: ReviewsState,
    /// Signed-in user
    pub session: SessionState,
    /// Orders and key inventory
    pub admin: AdminState,
}

impl StorefrontState {
    /// Empty cart, seeded reviews and admin data
    #[must_use]
    pub fn seed() -> Self {
        Self {
            reviews: ReviewsState::seed(),
            admin: AdminState::seed(),
            ..Self::default()
        }
    }
}

/// Every action the storefront accepts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorefrontAction {
    /// Cart
    Cart(CartAction),
    /// Checkout
    Checkout(CheckoutAction),
    /// Reviews
    Reviews(ReviewsAction),
    /// Session
    Session(SessionAction),
    /// Admin panel
    Admin(AdminAction),
    /// Submit the checkout with the current cart contents
    SubmitCheckout,
}

impl From<CartAction> for StorefrontAction {
    fn from(action: CartAction) -> Self {
        Self::Cart(action)
    }
}

impl From<CheckoutAction> for StorefrontAction {
    fn from(action: CheckoutAction) -> Self {
        Self::Checkout(action)
    }
}

impl From<ReviewsAction> for StorefrontAction {
    fn from(action: ReviewsAction) -> Self {
        Self::Reviews(action)
    }
}

impl From<SessionAction> for StorefrontAction {
    fn from(action: SessionAction) -> Self {
        Self::Session(action)
    }
}

impl From<AdminAction> for StorefrontAction {
    fn from(action: AdminAction) -> Self {
        Self::Admin(action)
    }
}

type Effects = SmallVec<[Effect<StorefrontAction>; 4]>;

/// Root reducer
#[derive(Clone, Debug)]
pub struct StorefrontReducer {
    features: CombinedReducer<StorefrontState, StorefrontAction, StorefrontEnvironment>,
}

impl StorefrontReducer {
    /// Creates the root reducer from the feature reducers
    #[must_use]
    pub fn new() -> Self {
        let features = combine_reducers(vec![
            Box::new(scope(
                CartReducer::new(),
                |s: &mut StorefrontState| &mut s.cart,
                |a| match a {
                    StorefrontAction::Cart(a) => Some(a),
                    _ => None,
                },
                StorefrontAction::Cart,
            )),
            Box::new(scope(
                CheckoutReducer::new(),
                |s: &mut StorefrontState| &mut s.checkout,
                |a| match a {
                    StorefrontAction::Checkout(a) => Some(a),
                    _ => None,
                },
                StorefrontAction::Checkout,
            )),
            Box::new(scope(
                ReviewsReducer::new(),
                |s: &mut StorefrontState| &mut s.reviews,
                |a| match a {
                    StorefrontAction::Reviews(a) => Some(a),
                    _ => None,
                },
                StorefrontAction::Reviews,
            )),
            Box::new(scope(
                SessionReducer::new(),
                |s: &mut StorefrontState| &mut s.session,
                |a| match a {
                    StorefrontAction::Session(a) => Some(a),
                    _ => None,
                },
                StorefrontAction::Session,
            )),
            Box::new(scope(
                AdminReducer::new(),
                |s: &mut StorefrontState| &mut s.admin,
                |a| match a {
                    StorefrontAction::Admin(a) => Some(a),
                    _ => None,
                },
                StorefrontAction::Admin,
            )),
        ]);

        Self { features }
    }

    /// Empties the cart and records the order once a payment completes
    ///
    /// The recorded order's id is stored on the completed checkout.
    fn fulfil(&self, state: &mut StorefrontState, env: &StorefrontEnvironment) -> Effects {
        let CheckoutPhase::Completed { order, .. } = &state.checkout.phase else {
            return SmallVec::new();
        };
        let order = order.clone();
        let assigned = state.admin.next_order_id();

        let mut effects = self
            .features
            .reduce(state, StorefrontAction::Cart(CartAction::ClearCart), env);
        effects.extend(
            self.features
                .reduce(state, StorefrontAction::Admin(AdminAction::RecordOrder { order }), env),
        );

        if let CheckoutPhase::Completed { order_id, .. } = &mut state.checkout.phase {
            *order_id = Some(assigned);
        }
        effects
    }
}

impl Default for StorefrontReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for StorefrontReducer {
    type State = StorefrontState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            StorefrontAction::SubmitCheckout => {
                let order = OrderSummary::from_cart(&state.cart);
                self.features
                    .reduce(state, StorefrontAction::Checkout(CheckoutAction::Submit { order }), env)
            },

            action @ StorefrontAction::Checkout(CheckoutAction::PaymentSucceeded { .. }) => {
                let was_processing = state.checkout.phase.is_processing();
                let mut effects = self.features.reduce(state, action, env);
                if was_processing {
                    effects.extend(self.fulfil(state, env));
                }
                effects
            },

            action => self.features.reduce(state, action, env),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::features::admin::OrderStatus;
    use crate::features::checkout::CustomerDetails;
    use crate::payment::{PaymentMethod, PaymentReceipt};
    use crate::types::{Money, OrderId, ProductId};
    use keystore_core::environment::Clock;
    use keystore_testing::{resolve_effects, test_clock, ReducerTest};
    use std::sync::Arc;

    fn env() -> StorefrontEnvironment {
        StorefrontEnvironment::instant(Arc::new(test_clock()))
    }

    fn product(id: u32) -> crate::catalog::Product {
        Catalog::seed()
            .get(ProductId::new(id))
            .cloned()
            .expect("seeded product")
    }

    fn details() -> CheckoutAction {
        CheckoutAction::UpdateDetails {
            details: CustomerDetails {
                email: "ivan@example.com".to_string(),
                first_name: "Иван".to_string(),
                last_name: "Петров".to_string(),
                phone: "+7 900 123-45-67".to_string(),
            },
            agree_to_terms: true,
        }
    }

    async fn run(reducer: &StorefrontReducer, state: &mut StorefrontState, action: StorefrontAction, env: &StorefrontEnvironment) {
        let mut pending = vec![action];
        while let Some(action) = pending.pop() {
            let effects = reducer.reduce(state, action, env);
            pending.extend(resolve_effects(effects).await);
        }
    }

    #[test]
    fn test_actions_reach_their_feature() {
        ReducerTest::new(StorefrontReducer::new())
            .with_env(env())
            .given_state(StorefrontState::seed())
            .when_action(StorefrontAction::Cart(CartAction::AddItem { product: product(2) }))
            .then_state(|state| {
                assert_eq!(state.cart.item_count(), 1);
                assert_eq!(state.cart.total(), Money::from_minor(7990));
                assert!(state.checkout.phase.is_editing());
                assert_eq!(state.admin.orders.len(), 3);
            })
            .run();
    }

    #[test]
    fn test_submit_checkout_snapshots_the_cart() {
        let reducer = StorefrontReducer::new();
        let env = env();
        let mut state = StorefrontState::seed();

        let _ = reducer.reduce(&mut state, CartAction::AddItem { product: product(1) }.into(), &env);
        let _ = reducer.reduce(&mut state, CartAction::AddItem { product: product(1) }.into(), &env);
        let _ = reducer.reduce(&mut state, details().into(), &env);
        let _ = reducer.reduce(&mut state, StorefrontAction::SubmitCheckout, &env);

        let CheckoutPhase::AwaitingConfirmation { order, invoice } = &state.checkout.phase else {
            panic!("expected AwaitingConfirmation, got {:?}", state.checkout.phase);
        };
        assert_eq!(order.summary.item_count, 2);
        assert_eq!(order.amount, Money::from_minor(9980));
        assert!(invoice.is_some());
        // Still in the cart until the payment succeeds
        assert_eq!(state.cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_successful_payment_clears_cart_and_records_order() {
        let reducer = StorefrontReducer::new();
        let env = env();
        let mut state = StorefrontState::seed();

        run(&reducer, &mut state, CartAction::AddItem { product: product(2) }.into(), &env).await;
        run(&reducer, &mut state, details().into(), &env).await;
        run(&reducer, &mut state, StorefrontAction::SubmitCheckout, &env).await;
        run(&reducer, &mut state, CheckoutAction::ConfirmPayment { card: None }.into(), &env).await;

        let CheckoutPhase::Completed { order_id, .. } = &state.checkout.phase else {
            panic!("expected Completed, got {:?}", state.checkout.phase);
        };
        assert_eq!(order_id.as_ref(), Some(&OrderId::from_sequence(4)));
        assert!(state.cart.is_empty());
        let order = state
            .admin
            .order(&OrderId::from_sequence(4))
            .expect("recorded order");
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.amount, Money::from_minor(7990));
        assert_eq!(order.customer_name, "Иван Петров");
        assert_eq!(order.created_at, test_clock().now());
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_the_cart() {
        let reducer = StorefrontReducer::new();
        let env = env();
        let mut state = StorefrontState::seed();

        run(&reducer, &mut state, CartAction::AddItem { product: product(3) }.into(), &env).await;
        run(&reducer, &mut state, details().into(), &env).await;
        run(
            &reducer,
            &mut state,
            CheckoutAction::SelectPaymentMethod {
                method: PaymentMethod::Card,
            }
            .into(),
            &env,
        )
        .await;
        run(&reducer, &mut state, StorefrontAction::SubmitCheckout, &env).await;
        run(&reducer, &mut state, CheckoutAction::ConfirmPayment { card: None }.into(), &env).await;

        assert!(matches!(state.checkout.phase, CheckoutPhase::AwaitingConfirmation { .. }));
        assert!(state.checkout.last_error.is_some());
        assert_eq!(state.cart.item_count(), 1);
        assert_eq!(state.admin.orders.len(), 3);
    }

    #[test]
    fn test_stray_payment_result_does_not_touch_the_cart() {
        let reducer = StorefrontReducer::new();
        let env = env();
        let mut state = StorefrontState::seed();
        let _ = reducer.reduce(&mut state, CartAction::AddItem { product: product(1) }.into(), &env);

        let receipt = PaymentReceipt {
            method: PaymentMethod::Sbp,
            amount: Money::from_minor(4990),
            transaction_id: "SBP_0".to_string(),
            timestamp: test_clock().now(),
            card: None,
        };
        let effects = reducer.reduce(
            &mut state,
            CheckoutAction::PaymentSucceeded { receipt }.into(),
            &env,
        );

        assert!(effects.is_empty());
        assert_eq!(state.cart.item_count(), 1);
        assert_eq!(state.admin.orders.len(), 3);
    }
}
