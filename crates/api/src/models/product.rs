//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orchard_core::ProductId;

/// A catalog product.
///
/// `avg_rating` and `review_count` are denormalized aggregates over the
/// product's reviews, recomputed eagerly whenever a review is created.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in the currency's standard unit, always > 0.
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    /// Units available for purchase; decremented at order finalization.
    pub stock_quantity: i32,
    /// Mean review rating rounded to 2 decimal places, 0 when unreviewed.
    pub avg_rating: Decimal,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
}
