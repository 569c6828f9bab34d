//! Storefront features, one reducer each.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod reviews;
pub mod session;
