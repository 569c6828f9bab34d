//! Product catalog endpoints.
//!
//! - GET /api/v1/products - All products
//! - GET /api/v1/products/:id - One product

#![allow(clippy::missing_errors_doc)]

use crate::catalog::Product;
use crate::server::state::AppState;
use crate::types::ProductId;
use axum::{
    extract::{Path, State},
    Json,
};
use keystore_web::AppError;
use serde::Serialize;

/// A product with its computed discount
#[derive(Debug, Serialize)]
pub struct ProductView {
    /// The product
    #[serde(flatten)]
    pub product: Product,
    /// Discount against the original price, in whole percent
    pub discount_percent: u64,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            discount_percent: product.discount_percent(),
            product: product.clone(),
        }
    }
}

/// List the catalog.
///
/// ```bash
/// curl http://localhost:3000/api/v1/products
/// ```
#[allow(clippy::unused_async)]
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    Json(state.catalog.products().iter().map(ProductView::from).collect())
}

/// Get one product.
#[allow(clippy::unused_async)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ProductView>, AppError> {
    state
        .catalog
        .get(ProductId::new(id))
        .map(|product| Json(ProductView::from(product)))
        .ok_or_else(|| AppError::not_found("Product", id))
}
