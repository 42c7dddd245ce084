//! Review service and rating aggregation.
//!
//! Products carry denormalized `avg_rating` and `review_count` columns.
//! After every review write the aggregates are recomputed from the full
//! review set rather than adjusted incrementally, so they can never drift.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use orchard_core::{ProductId, UserId, round_money};

use crate::db::reviews::ReviewWithAuthor;
use crate::db::{ProductRepository, RepositoryError, ReviewRepository};
use crate::models::Review;

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Referenced product doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// The user has already reviewed this product.
    #[error("you have already reviewed this product")]
    AlreadyReviewed,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Mean rating rounded to 2 decimal places, plus the count.
///
/// An empty set yields `(0, 0)`, the state a product returns to if all of
/// its reviews are removed.
#[must_use]
pub fn rating_summary(ratings: &[i32]) -> (Decimal, i32) {
    if ratings.is_empty() {
        return (Decimal::ZERO, 0);
    }

    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let avg = Decimal::from(sum) / Decimal::from(ratings.len());
    let count = i32::try_from(ratings.len()).unwrap_or(i32::MAX);
    (round_money(avg), count)
}

/// Review service.
pub struct ReviewService<'a> {
    products: ProductRepository<'a>,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// All reviews for a product, newest first, with author names.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` if the product doesn't exist.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<ReviewWithAuthor>, ReviewError> {
        self.require_product(product_id).await?;
        let reviews = self.reviews.list_for_product(product_id).await?;
        Ok(reviews)
    }

    /// Create a review and refresh the product's rating aggregates.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` if the product doesn't exist.
    /// Returns `ReviewError::AlreadyReviewed` on a second review from the
    /// same user.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i32,
        comment: &str,
    ) -> Result<Review, ReviewError> {
        self.require_product(product_id).await?;

        let review = self
            .reviews
            .create(product_id, user_id, rating, comment)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ReviewError::AlreadyReviewed,
                other => ReviewError::Repository(other),
            })?;

        let ratings = self.reviews.ratings_for_product(product_id).await?;
        let (avg, count) = rating_summary(&ratings);
        self.products.set_rating(product_id, avg, count).await?;

        Ok(review)
    }

    async fn require_product(&self, product_id: ProductId) -> Result<(), ReviewError> {
        if self.products.get(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ratings_reset_to_zero() {
        assert_eq!(rating_summary(&[]), (Decimal::ZERO, 0));
    }

    #[test]
    fn test_single_rating() {
        assert_eq!(rating_summary(&[4]), (Decimal::from(4), 1));
    }

    #[test]
    fn test_mean_rounds_to_two_places() {
        // (5 + 4 + 4) / 3 = 4.3333... -> 4.33
        assert_eq!(rating_summary(&[5, 4, 4]), (Decimal::new(433, 2), 3));
    }

    #[test]
    fn test_half_means_use_bankers_rounding() {
        // (4 + 5) / 2 = 4.5, two places already, no rounding needed
        assert_eq!(rating_summary(&[4, 5]), (Decimal::new(45, 1).round_dp(2), 2));
    }
}
