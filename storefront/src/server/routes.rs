//! Router configuration for the storefront.

use super::state::AppState;
use crate::api::{admin, cart, catalog, checkout, reviews, session};
use crate::app::{StorefrontAction, StorefrontReducer, StorefrontState};
use crate::environment::StorefrontEnvironment;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use keystore_web::correlation_id_layer;
use keystore_web::handlers::{health_check, health_check_with_store};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health`, `/health/ready`: liveness and store readiness
/// - `/api/v1/...`: the storefront API
///
/// Every response carries an `X-Correlation-ID` header.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        // Cart
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/:id",
            put(cart::update_quantity).delete(cart::remove_item),
        )
        // Checkout
        .route("/payment-methods", get(checkout::list_payment_methods))
        .route("/checkout", get(checkout::get_checkout))
        .route("/checkout/details", put(checkout::update_details))
        .route("/checkout/submit", post(checkout::submit))
        .route("/checkout/confirm", post(checkout::confirm))
        .route("/checkout/cancel", post(checkout::cancel))
        .route("/checkout/reset", post(checkout::reset))
        // Reviews
        .route("/reviews", get(reviews::list_reviews).post(reviews::submit_review))
        // Session
        .route("/session", get(session::get_session))
        .route("/session/login", post(session::login))
        .route("/session/logout", post(session::logout))
        // Admin
        .route("/admin/stats", get(admin::stats))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/:id/status", put(admin::update_order_status))
        .route("/admin/orders/:id/assign-keys", post(admin::assign_keys))
        .route("/admin/keys", get(admin::list_keys).post(admin::add_key))
        .route("/admin/keys/:id", delete(admin::delete_key));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/health/ready",
            get(health_check_with_store::<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>),
        )
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
