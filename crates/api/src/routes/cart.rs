//! Cart route handlers. All require authentication.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use orchard_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartView;
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddItemPayload {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemPayload {
    pub quantity: i32,
}

fn require_positive(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_owned(),
        ));
    }
    Ok(())
}

/// GET /cart - The user's cart joined with live product data.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool()).view(user.id).await?;
    Ok(Json(view))
}

/// POST /cart/items - Add a product, merging with any existing line.
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<CartView>> {
    require_positive(payload.quantity)?;
    let view = CartService::new(state.pool())
        .add_item(user.id, payload.product_id, payload.quantity)
        .await?;
    Ok(Json(view))
}

/// PUT /cart/items/{id} - Overwrite a line's quantity.
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<CartView>> {
    require_positive(payload.quantity)?;
    let view = CartService::new(state.pool())
        .set_quantity(user.id, product_id, payload.quantity)
        .await?;
    Ok(Json(view))
}

/// DELETE /cart/items/{id} - Remove a line.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool())
        .remove_item(user.id, product_id)
        .await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(require_positive(0).is_err());
        assert!(require_positive(-3).is_err());
        assert!(require_positive(1).is_ok());
    }
}
