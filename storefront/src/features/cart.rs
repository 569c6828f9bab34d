//! Shopping cart.
//!
//! An ordered list of line items plus two derived fields, `item_count` and
//! `total`. The derived fields are private and recomputed from the whole item
//! list after every action, so they can never go stale.
//!
//! Every action is total: unknown ids are ignored and a quantity of zero or
//! less removes the line. The cart never produces effects.

use crate::catalog::Product;
use crate::types::{Money, ProductId};
use keystore_core::{effect::Effect, reducer::Reducer, SmallVec};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

// ============================================================================
// State
// ============================================================================

/// One line of the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id (unique within the cart)
    pub id: ProductId,
    /// Product title
    pub title: String,
    /// Product description
    pub description: String,
    /// Unit price at the time the product was added
    pub price: Money,
    /// Always at least 1 while the item is in the cart
    pub quantity: u32,
}

impl CartItem {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            quantity: 1,
        }
    }

    /// `price × quantity`
    #[must_use]
    pub const fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Cart contents and derived totals
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CartState {
    items: Vec<CartItem>,
    item_count: u64,
    total: Money,
}

impl CartState {
    /// Items in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of all quantities
    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Sum of `price × quantity` over all items
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// Checks if the cart holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for a product, if present
    #[must_use]
    pub fn item(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn recompute(&mut self) {
        self.item_count = self
            .items
            .iter()
            .fold(0_u64, |count, item| count.saturating_add(u64::from(item.quantity)));
        self.total = self.items.iter().map(CartItem::line_total).sum();
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Cart actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartAction {
    /// Add one unit of a product
    AddItem {
        /// Product to add
        product: Product,
    },
    /// Set a line's quantity; zero or less removes the line
    UpdateQuantity {
        /// Product id of the line
        id: ProductId,
        /// New absolute quantity
        quantity: i64,
    },
    /// Remove a line
    RemoveItem {
        /// Product id of the line
        id: ProductId,
    },
    /// Empty the cart
    ClearCart,
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the cart
///
/// Generic over the environment so it can be scoped into any parent store;
/// it never reads its environment.
pub struct CartReducer<E = ()> {
    _environment: PhantomData<fn(&E)>,
}

impl<E> CartReducer<E> {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _environment: PhantomData,
        }
    }
}

impl<E> Default for CartReducer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for CartReducer<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for CartReducer<E> {}

impl<E> std::fmt::Debug for CartReducer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CartReducer")
    }
}

impl<E> Reducer for CartReducer<E> {
    type State = CartState;
    type Action = CartAction;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::AddItem { product } => {
                if let Some(item) = state.item_mut(product.id) {
                    item.quantity = item.quantity.saturating_add(1);
                } else {
                    state.items.push(CartItem::from_product(&product));
                }
                tracing::debug!(product_id = %product.id, "Added to cart");
            },

            CartAction::UpdateQuantity { id, quantity } if quantity <= 0 => {
                state.items.retain(|item| item.id != id);
                tracing::debug!(product_id = %id, "Removed from cart by quantity update");
            },

            CartAction::UpdateQuantity { id, quantity } => {
                if let Some(item) = state.item_mut(id) {
                    item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                    tracing::debug!(product_id = %id, quantity = item.quantity, "Updated cart quantity");
                }
            },

            CartAction::RemoveItem { id } => {
                state.items.retain(|item| item.id != id);
                tracing::debug!(product_id = %id, "Removed from cart");
            },

            CartAction::ClearCart => {
                state.items.clear();
                tracing::debug!("Cleared cart");
            },
        }

        state.recompute();
        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use keystore_testing::{assertions, ReducerTest};

    fn product(id: u32) -> Product {
        Catalog::seed()
            .get(ProductId::new(id))
            .cloned()
            .expect("seed product")
    }

    fn cart_with(actions: Vec<CartAction>) -> CartState {
        let reducer = CartReducer::<()>::new();
        let mut state = CartState::default();
        for action in actions {
            let _ = reducer.reduce(&mut state, action, &());
        }
        state
    }

    #[test]
    fn test_add_new_product_appends_line() {
        ReducerTest::new(CartReducer::<()>::new())
            .with_env(())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem { product: product(1) })
            .then_state(|cart| {
                assert_eq!(cart.items().len(), 1);
                assert_eq!(cart.items()[0].quantity, 1);
                assert_eq!(cart.items()[0].title, "Windows 11 Home");
                assert_eq!(cart.item_count(), 1);
                assert_eq!(cart.total(), Money::from_minor(4990));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_add_existing_product_increments_quantity() {
        ReducerTest::new(CartReducer::<()>::new())
            .with_env(())
            .given_actions([CartAction::AddItem { product: product(1) }])
            .when_action(CartAction::AddItem { product: product(1) })
            .then_state(|cart| {
                assert_eq!(cart.items().len(), 1);
                assert_eq!(cart.items()[0].quantity, 2);
                assert_eq!(cart.item_count(), 2);
                assert_eq!(cart.total(), Money::from_minor(9980));
            })
            .run();
    }

    #[test]
    fn test_update_quantity_sets_absolute_value() {
        ReducerTest::new(CartReducer::<()>::new())
            .with_env(())
            .given_actions([
                CartAction::AddItem { product: product(1) },
                CartAction::AddItem { product: product(1) },
            ])
            .when_action(CartAction::UpdateQuantity {
                id: ProductId::new(1),
                quantity: 5,
            })
            .then_state(|cart| {
                assert_eq!(cart.items()[0].quantity, 5);
                assert_eq!(cart.item_count(), 5);
                assert_eq!(cart.total(), Money::from_minor(24950));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_non_positive_quantity_removes_line() {
        let base = cart_with(vec![
            CartAction::AddItem { product: product(2) },
            CartAction::AddItem { product: product(3) },
        ]);

        let removed = {
            let mut state = base.clone();
            let _ = CartReducer::<()>::new().reduce(&mut state, CartAction::RemoveItem { id: ProductId::new(2) }, &());
            state
        };

        for quantity in [0, -5] {
            let mut state = base.clone();
            let _ = CartReducer::<()>::new().reduce(
                &mut state,
                CartAction::UpdateQuantity {
                    id: ProductId::new(2),
                    quantity,
                },
                &(),
            );
            assert_eq!(state, removed);
        }
        assert_eq!(removed.item_count(), 1);
        assert_eq!(removed.total(), Money::from_minor(12990));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        for action in [
            CartAction::RemoveItem { id: ProductId::new(9) },
            CartAction::UpdateQuantity {
                id: ProductId::new(9),
                quantity: 3,
            },
        ] {
            ReducerTest::new(CartReducer::<()>::new())
                .with_env(())
                .given_actions([CartAction::AddItem { product: product(1) }])
                .when_action(action)
                .then_state_unchanged()
                .then_effects(assertions::assert_no_effects)
                .run();
        }
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let cart = cart_with(vec![
            CartAction::AddItem { product: product(2) },
            CartAction::AddItem { product: product(3) },
        ]);

        let ids: Vec<u32> = cart.items().iter().map(|item| item.id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Money::from_minor(20980));
    }

    #[test]
    fn test_clear_cart() {
        ReducerTest::new(CartReducer::<()>::new())
            .with_env(())
            .given_actions([
                CartAction::AddItem { product: product(1) },
                CartAction::AddItem { product: product(2) },
            ])
            .when_action(CartAction::ClearCart)
            .then_state(|cart| {
                assert!(cart.is_empty());
                assert_eq!(cart.item_count(), 0);
                assert_eq!(cart.total(), Money::ZERO);
            })
            .run();
    }

    #[test]
    fn test_huge_quantity_is_clamped() {
        let cart = cart_with(vec![
            CartAction::AddItem { product: product(1) },
            CartAction::UpdateQuantity {
                id: ProductId::new(1),
                quantity: i64::MAX,
            },
            CartAction::AddItem { product: product(1) },
        ]);

        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.item_count(), u64::from(u32::MAX));
    }
}
