//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use orchard_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Database row for a review joined with its author's name.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// A review together with the author's display name.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub user_name: String,
}

impl From<ReviewRow> for ReviewWithAuthor {
    fn from(row: ReviewRow) -> Self {
        let user_name = match (row.first_name, row.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => "Anonymous".to_owned(),
        };

        Self {
            review: Review {
                id: row.id,
                product_id: row.product_id,
                user_id: row.user_id,
                rating: row.rating,
                comment: row.comment,
                created_at: row.created_at,
            },
            user_name,
        }
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all reviews for a product, newest first, with author names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, r.created_at,
                    u.first_name, u.last_name
             FROM reviews r
             LEFT JOIN users u ON u.id = r.user_id
             WHERE r.product_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewWithAuthor::from).collect())
    }

    /// All ratings currently on record for a product.
    ///
    /// Used by the rating recompute, which always works from the full source
    /// set rather than keeping a running average.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ratings_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<i32>, RepositoryError> {
        let ratings = sqlx::query_scalar::<_, i32>(
            "SELECT rating FROM reviews WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ratings)
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed this
    /// product. Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i32,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct InsertedRow {
            id: ReviewId,
            created_at: DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, InsertedRow>(
            "INSERT INTO reviews (product_id, user_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "user has already reviewed this product".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        Ok(Review {
            id: row.id,
            product_id,
            user_id,
            rating,
            comment: comment.to_owned(),
            created_at: row.created_at,
        })
    }
}
