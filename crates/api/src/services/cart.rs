//! Cart management service.
//!
//! Every mutation re-checks the product's live stock before writing; a cart
//! line is a wish, not a reservation, so the same check runs again at
//! checkout.

use sqlx::PgPool;
use thiserror::Error;

use orchard_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::cart::CartView;
use crate::models::Product;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Referenced product doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// Cart has no line for the referenced product.
    #[error("item not in cart")]
    ItemNotFound,

    /// Requested quantity exceeds the units on hand.
    #[error("insufficient stock for {name}")]
    InsufficientStock { name: String },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Whether merging `requested` units onto a line of `existing` units would
/// exceed `stock`. An `i32` overflow of the merged quantity counts as
/// exceeding.
const fn exceeds_stock(existing: i32, requested: i32, stock: i32) -> bool {
    match existing.checked_add(requested) {
        Some(merged) => merged > stock,
        None => true,
    }
}

/// Cart management service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's cart joined with live product data.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let lines = self.carts.lines(cart.id).await?;
        Ok(CartView::new(&cart, lines))
    }

    /// Add `quantity` units of a product, merging with any existing line.
    ///
    /// The stock check covers the combined quantity, so repeatedly adding a
    /// scarce product fails once the line would exceed what's on hand.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` or `CartError::InsufficientStock`
    /// if the product can't satisfy the request.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        let product = self.require_product(product_id).await?;
        let cart = self.carts.get_or_create(user_id).await?;

        let existing = self
            .carts
            .get_item(cart.id, product_id)
            .await?
            .map_or(0, |item| item.quantity);

        if exceeds_stock(existing, quantity, product.stock_quantity) {
            return Err(CartError::InsufficientStock { name: product.name });
        }

        self.carts.add_item(cart.id, product_id, quantity).await?;
        self.carts.touch(cart.id).await?;

        let lines = self.carts.lines(cart.id).await?;
        Ok(CartView::new(&cart, lines))
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the product isn't in the cart.
    /// Returns `CartError::InsufficientStock` if stock can't cover the new
    /// quantity.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        let product = self.require_product(product_id).await?;

        if quantity > product.stock_quantity {
            return Err(CartError::InsufficientStock { name: product.name });
        }

        let cart = self.carts.get_or_create(user_id).await?;
        let updated = self
            .carts
            .set_item_quantity(cart.id, product_id, quantity)
            .await?;
        if !updated {
            return Err(CartError::ItemNotFound);
        }
        self.carts.touch(cart.id).await?;

        let lines = self.carts.lines(cart.id).await?;
        Ok(CartView::new(&cart, lines))
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the product isn't in the cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;

        let removed = self.carts.remove_item(cart.id, product_id).await?;
        if !removed {
            return Err(CartError::ItemNotFound);
        }
        self.carts.touch(cart.id).await?;

        let lines = self.carts.lines(cart.id).await?;
        Ok(CartView::new(&cart, lines))
    }

    async fn require_product(&self, product_id: ProductId) -> Result<Product, CartError> {
        self.products
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_within_stock_allowed() {
        // Adding twice merges onto one line; 2 + 3 fits in stock 5.
        assert!(!exceeds_stock(2, 3, 5));
        assert!(!exceeds_stock(0, 5, 5));
    }

    #[test]
    fn test_merge_exceeding_stock_rejected() {
        assert!(exceeds_stock(2, 3, 4));
        assert!(exceeds_stock(0, 5, 3));
    }

    #[test]
    fn test_merge_overflow_rejected() {
        assert!(exceeds_stock(i32::MAX, 1, i32::MAX));
        assert!(exceeds_stock(1, i32::MAX, i32::MAX));
    }
}
