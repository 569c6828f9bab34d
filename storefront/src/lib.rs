//! # KeyStore Storefront
//!
//! An online shop for software license keys, written as reducers over a
//! single [`Store`](keystore_runtime::Store):
//!
//! - **Catalog**: the products on sale
//! - **Cart**: line items with derived item count and total
//! - **Checkout**: customer details, payment method commission, mock payment
//! - **Reviews**: customer reviews with a rating summary
//! - **Session**: mock sign-in with an administrator account
//! - **Admin**: orders and the license key inventory
//!
//! Nothing is persisted. Every process serves one storefront session whose
//! state lives in memory, seeded with demo data.
//!
//! ## Example
//!
//! ```
//! use keystore_core::reducer::Reducer;
//! use keystore_storefront::catalog::Catalog;
//! use keystore_storefront::features::cart::{CartAction, CartReducer, CartState};
//! use keystore_storefront::types::{Money, ProductId};
//!
//! let catalog = Catalog::seed();
//! let mut cart = CartState::default();
//! let reducer = CartReducer::<()>::new();
//!
//! if let Some(product) = catalog.get(ProductId::new(2)).cloned() {
//!     let _ = reducer.reduce(&mut cart, CartAction::AddItem { product }, &());
//! }
//! assert_eq!(cart.item_count(), 1);
//! assert_eq!(cart.total(), Money::from_minor(7990));
//! ```

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod features;
pub mod payment;
pub mod server;
pub mod types;

pub use app::{StorefrontAction, StorefrontReducer, StorefrontState, StorefrontStore};
pub use config::Config;
pub use environment::StorefrontEnvironment;
pub use server::{build_router, AppState};
