//! Customer reviews.
//!
//! Reviews are kept newest first. A submitted review is published after the
//! configured moderation delay as an unverified review dated today.

use crate::environment::StorefrontEnvironment;
use crate::types::{ProductId, ReviewId};
use chrono::NaiveDate;
use keystore_core::effect::Effect;
use keystore_core::environment::Clock;
use keystore_core::{async_effect, delay, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Serialize};

/// Review validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Reviewer name missing
    #[error("Name is required")]
    MissingName,
    /// Review text missing
    #[error("Comment is required")]
    MissingComment,
    /// Rating outside 1..=5
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// A published review
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id
    pub id: ReviewId,
    /// Reviewer display name
    pub user_name: String,
    /// 1 to 5 stars
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// Publication date
    pub date: NaiveDate,
    /// Written by a confirmed buyer
    pub verified: bool,
    /// Reviewed product
    pub product_id: ProductId,
}

/// A review as submitted by a customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Reviewed product (defaults to product 1)
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Reviewer name
    pub name: String,
    /// 1 to 5 stars
    pub rating: u8,
    /// Review text
    pub comment: String,
}

impl NewReview {
    /// Checks name, comment and rating
    ///
    /// # Errors
    ///
    /// The first [`ReviewError`] found.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.name.trim().is_empty() {
            return Err(ReviewError::MissingName);
        }
        if self.comment.trim().is_empty() {
            return Err(ReviewError::MissingComment);
        }
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::InvalidRating(self.rating));
        }
        Ok(())
    }
}

/// Number of reviews with a given rating
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RatingCount {
    /// Stars
    pub rating: u8,
    /// Reviews with that many stars
    pub count: usize,
}

/// Aggregate rating figures
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Number of reviews
    pub count: usize,
    /// Mean rating, 0 when there are no reviews
    pub average: f64,
    /// Counts for 5 down to 1 stars
    pub distribution: Vec<RatingCount>,
}

/// Published reviews and submission status
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewsState {
    reviews: Vec<Review>,
    next_id: u64,
    /// Submissions waiting to be published
    pub pending: usize,
    /// Reason the last submission was rejected
    pub last_error: Option<String>,
}

impl ReviewsState {
    /// Starts from an existing list, newest first
    #[must_use]
    pub fn new(reviews: Vec<Review>) -> Self {
        let next_id = reviews
            .iter()
            .map(|r| r.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            reviews,
            next_id,
            pending: 0,
            last_error: None,
        }
    }

    /// The reviews shown on the storefront at launch
    #[must_use]
    pub fn seed() -> Self {
        Self::new(vec![
            seed_review(
                1,
                "Александр К.",
                5,
                "Ключ пришел моментально, активация прошла без проблем. Windows 11 Pro работает стабильно.",
                (2024, 9, 5),
                true,
                2,
            ),
            seed_review(
                2,
                "Мария С.",
                5,
                "Оплатила через СБП, ключ получила в течение 3 минут. Все честно, как и обещали.",
                (2024, 9, 4),
                true,
                2,
            ),
            seed_review(
                3,
                "Игорь В.",
                4,
                "Хороший магазин, но хотелось бы больше способов оплаты. В остальном быстро и надежно.",
                (2024, 9, 3),
                false,
                1,
            ),
            seed_review(
                4,
                "Екатерина Л.",
                5,
                "Покупала Windows 11 Home для нового ноутбука. Ключ рабочий, цена приятно удивила.",
                (2024, 9, 2),
                true,
                1,
            ),
            seed_review(
                5,
                "Дмитрий П.",
                5,
                "Версия для рабочей станции активировалась с первого раза. Все заявленные функции на месте.",
                (2024, 9, 1),
                true,
                3,
            ),
            seed_review(
                6,
                "Анна М.",
                4,
                "Сомневалась в начале, но все оказалось честно. Ключ работает, Windows обновляется.",
                (2024, 8, 30),
                true,
                2,
            ),
        ])
    }

    /// Reviews newest first, optionally for one product
    #[must_use]
    pub fn reviews(&self, product: Option<ProductId>) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| product.is_none_or(|id| r.product_id == id))
            .collect()
    }

    /// Count, average and distribution, optionally for one product
    #[must_use]
    pub fn summary(&self, product: Option<ProductId>) -> ReviewSummary {
        let reviews = self.reviews(product);
        let count = reviews.len();
        let average = if count == 0 {
            0.0
        } else {
            let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
            f64::from(sum) / f64::from(u32::try_from(count).unwrap_or(u32::MAX))
        };
        let distribution = (1..=5_u8)
            .rev()
            .map(|rating| RatingCount {
                rating,
                count: reviews.iter().filter(|r| r.rating == rating).count(),
            })
            .collect();

        ReviewSummary {
            count,
            average,
            distribution,
        }
    }
}

impl Default for ReviewsState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn seed_review(
    id: u64,
    user_name: &str,
    rating: u8,
    comment: &str,
    (year, month, day): (i32, u32, u32),
    verified: bool,
    product_id: u32,
) -> Review {
    Review {
        id: ReviewId::new(id),
        user_name: user_name.to_string(),
        rating,
        comment: comment.to_string(),
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        verified,
        product_id: ProductId::new(product_id),
    }
}

/// Review actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewsAction {
    // Commands
    /// Submit a review for publication
    SubmitReview {
        /// The review
        review: NewReview,
    },

    // Events
    /// The review passed moderation and is visible
    ReviewPublished {
        /// Published review
        review: Review,
    },
    /// The submission was invalid
    ReviewRejected {
        /// Rejection reason
        reason: String,
    },
}

/// Reducer for reviews
#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewsReducer;

impl ReviewsReducer {
    /// Creates a new `ReviewsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ReviewsReducer {
    type State = ReviewsState;
    type Action = ReviewsAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ReviewsAction::SubmitReview { review } => {
                if let Err(error) = review.validate() {
                    tracing::warn!(%error, "Review rejected");
                    let reason = error.to_string();
                    state.last_error = Some(reason.clone());
                    return smallvec![async_effect! {
                        Some(ReviewsAction::ReviewRejected { reason })
                    }];
                }

                let published = Review {
                    id: ReviewId::new(state.next_id),
                    user_name: review.name.trim().to_string(),
                    rating: review.rating,
                    comment: review.comment.trim().to_string(),
                    date: env.clock.now().date_naive(),
                    verified: false,
                    product_id: review.product_id.unwrap_or(ProductId::new(1)),
                };
                state.next_id += 1;
                state.pending += 1;
                state.last_error = None;

                tracing::debug!(review_id = %published.id, "Review queued for publication");

                smallvec![delay! {
                    duration: env.settings.review_delay,
                    action: ReviewsAction::ReviewPublished { review: published }
                }]
            },

            ReviewsAction::ReviewPublished { review } => {
                tracing::info!(review_id = %review.id, product_id = %review.product_id, "Review published");
                state.pending = state.pending.saturating_sub(1);
                state.reviews.insert(0, review);
                SmallVec::new()
            },

            // Already recorded when the submission was rejected
            ReviewsAction::ReviewRejected { .. } => SmallVec::new(),
        }
    }
}
