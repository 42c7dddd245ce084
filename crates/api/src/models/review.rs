//! Review domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{ProductId, ReviewId, UserId};

/// A product review. One per (user, product) pair.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Star rating, 1-5.
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
