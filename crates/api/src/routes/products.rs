//! Catalog and review route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orchard_core::{ProductId, ReviewId, UserId};

use crate::db::reviews::ReviewWithAuthor;
use crate::db::{ProductFilter, ProductRepository, ProductSort};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Product, Review};
use crate::services::reviews::ReviewService;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
const MAX_COMMENT_LENGTH: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    /// Full-text search over name and description; takes precedence over
    /// `category`.
    pub q: Option<String>,
    pub sort: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub rating: i32,
    pub comment: String,
}

/// A review as served to clients, with the author's display name.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub comment: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewResponse {
    fn new(review: Review, user_name: String) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            user_name,
            created_at: review.created_at,
        }
    }
}

impl From<ReviewWithAuthor> for ReviewResponse {
    fn from(r: ReviewWithAuthor) -> Self {
        Self::new(r.review, r.user_name)
    }
}

/// Clamp pagination to sane bounds.
fn clamp_paging(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (skip, limit)
}

fn parse_sort(sort: Option<&str>) -> Result<ProductSort> {
    match sort {
        None | Some("newest") => Ok(ProductSort::Newest),
        Some("price_asc") => Ok(ProductSort::PriceAsc),
        Some("price_desc") => Ok(ProductSort::PriceDesc),
        Some(other) => Err(AppError::BadRequest(format!("Unknown sort: {other}"))),
    }
}

/// GET /products - List products with filtering, sorting, and pagination.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
    let (skip, limit) = clamp_paging(params.skip, params.limit);
    let filter = ProductFilter {
        category: params.category,
        search: params.q,
        sort: parse_sort(params.sort.as_deref())?,
        skip,
        limit,
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// GET /products/{id} - Product detail.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;
    Ok(Json(product))
}

/// GET /products/{id}/reviews - Reviews for a product, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ReviewResponse>>> {
    let reviews = ReviewService::new(state.pool()).list(id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// POST /products/{id}/reviews - Create a review and refresh the product's
/// rating aggregates.
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_owned(),
        ));
    }
    let comment = payload.comment.trim();
    if comment.is_empty() || comment.len() > MAX_COMMENT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Comment must be between 1 and {MAX_COMMENT_LENGTH} characters"
        )));
    }

    let review = ReviewService::new(state.pool())
        .create(id, user.id, payload.rating, comment)
        .await?;

    let response = ReviewResponse::new(review, user.full_name());
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_paging_defaults() {
        assert_eq!(clamp_paging(None, None), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_clamp_paging_bounds() {
        assert_eq!(clamp_paging(Some(-5), Some(0)), (0, 1));
        assert_eq!(clamp_paging(Some(40), Some(500)), (40, MAX_LIMIT));
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None).ok(), Some(ProductSort::Newest));
        assert_eq!(parse_sort(Some("price_asc")).ok(), Some(ProductSort::PriceAsc));
        assert_eq!(parse_sort(Some("price_desc")).ok(), Some(ProductSort::PriceDesc));
        assert!(parse_sort(Some("rating")).is_err());
    }
}
