//! Admin route handlers. All require the `is_admin` flag.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;

use orchard_core::{OrderId, OrderStatus, ProductId};

use crate::db::products::{NewProduct, ProductPatch};
use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::models::Product;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    pub stock_quantity: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProductPatchPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusPayload {
    pub status: OrderStatus,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Name must be between 1 and {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("Price must be positive".to_owned()));
    }
    Ok(())
}

fn validate_stock(stock_quantity: i32) -> Result<()> {
    if stock_quantity < 0 {
        return Err(AppError::BadRequest(
            "Stock quantity cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

/// POST /admin/products - Create a product.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse> {
    validate_name(&payload.name)?;
    validate_price(payload.price)?;
    validate_stock(payload.stock_quantity)?;
    if payload.description.trim().is_empty() {
        return Err(AppError::BadRequest("Description is required".to_owned()));
    }

    let new = NewProduct {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url,
        category: payload.category,
        stock_quantity: payload.stock_quantity,
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /admin/products/{id} - Partial update; absent fields are unchanged.
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPatchPayload>,
) -> Result<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        validate_stock(stock_quantity)?;
    }

    let patch = ProductPatch {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url,
        category: payload.category,
        stock_quantity: payload.stock_quantity,
    };

    let product = ProductRepository::new(state.pool()).update(id, &patch).await?;
    Ok(Json(product))
}

/// DELETE /admin/products/{id} - Delete a product.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Product".to_owned()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/orders - All orders in the system, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// PUT /admin/orders/{id}/status - Overwrite an order's status.
pub async fn set_order_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(payload): Json<OrderStatusPayload>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    orders.set_status(id, payload.status).await?;
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("Walnut Desk").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_price_must_be_positive() {
        assert!(validate_price(Decimal::new(999, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_stock_cannot_be_negative() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }
}
