//! Customer review endpoints.
//!
//! - GET /api/v1/reviews?product_id=2 - Reviews (newest first) and rating summary
//! - POST /api/v1/reviews - Submit a review, waiting for publication

#![allow(clippy::missing_errors_doc)]

use super::dispatch_and_settle;
use crate::app::StorefrontAction;
use crate::features::reviews::{NewReview, Review, ReviewSummary, ReviewsAction};
use crate::server::state::AppState;
use crate::types::ProductId;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use keystore_web::{ApiJson, AppError};
use serde::{Deserialize, Serialize};

/// Query parameters for listing reviews
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    /// Only reviews of this product
    pub product_id: Option<ProductId>,
}

/// Reviews with their rating summary
#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    /// Newest first
    pub reviews: Vec<Review>,
    /// Count, average and distribution
    pub summary: ReviewSummary,
}

/// List reviews.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Json<ReviewsResponse> {
    let response = state
        .store
        .state(|s| ReviewsResponse {
            reviews: s.reviews.reviews(query.product_id).into_iter().cloned().collect(),
            summary: s.reviews.summary(query.product_id),
        })
        .await;
    Json(response)
}

/// Submit a review.
///
/// Answers `201` with the published review once the moderation delay has
/// passed.
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/reviews \
///   -H "Content-Type: application/json" \
///   -d '{"product_id": 2, "name": "Ольга", "rating": 5, "comment": "Ключ пришёл сразу"}'
/// ```
pub async fn submit_review(
    State(state): State<AppState>,
    ApiJson(review): ApiJson<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let produced = dispatch_and_settle(
        &state.store,
        ReviewsAction::SubmitReview { review }.into(),
        state.action_timeout,
    )
    .await?;

    for action in produced {
        match action {
            StorefrontAction::Reviews(ReviewsAction::ReviewPublished { review }) => {
                return Ok((StatusCode::CREATED, Json(review)));
            },
            StorefrontAction::Reviews(ReviewsAction::ReviewRejected { reason }) => {
                return Err(AppError::validation(reason));
            },
            _ => {},
        }
    }

    Err(AppError::internal("The review was not published"))
}
