//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orchard_core::{CartId, ProductId, UserId, round_money};

/// A user's shopping cart. Exactly one exists per user; it is created lazily
/// on first access and emptied (never deleted) after a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// A line item inside a cart: the desired quantity of a product.
///
/// The quantity is not a reservation; stock is re-checked at every mutation
/// and again at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Live product data joined onto a cart line for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub stock_quantity: i32,
}

/// A cart line joined with its product's current state.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: CartLineProduct,
}

impl CartLine {
    /// Price of this line at current product prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A cart joined with live product data, plus the running total.
///
/// Lines whose product has been deleted are dropped from the view at query
/// time (they remain in storage).
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    /// Sum of line subtotals, rounded to 2 decimal places.
    pub total: Decimal,
}

impl CartView {
    /// Build a view from joined lines, computing the total.
    #[must_use]
    pub fn new(cart: &Cart, items: Vec<CartLine>) -> Self {
        let total = round_money(items.iter().map(CartLine::subtotal).sum());
        Self {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i32, quantity: i32, price: Decimal) -> CartLine {
        CartLine {
            product_id: ProductId::new(product_id),
            quantity,
            product: CartLineProduct {
                id: ProductId::new(product_id),
                name: format!("product {product_id}"),
                price,
                image_url: String::new(),
                stock_quantity: 100,
            },
        }
    }

    fn empty_cart() -> Cart {
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_total_rounds_to_two_places() {
        // 9.99 * 2 = 19.98
        let view = CartView::new(&empty_cart(), vec![line(1, 2, Decimal::new(999, 2))]);
        assert_eq!(view.total, Decimal::new(1998, 2));
    }

    #[test]
    fn test_view_total_sums_lines() {
        let view = CartView::new(
            &empty_cart(),
            vec![
                line(1, 2, Decimal::new(999, 2)),   // 19.98
                line(2, 1, Decimal::new(24_99, 2)), // 24.99
            ],
        );
        assert_eq!(view.total, Decimal::new(44_97, 2));
    }

    #[test]
    fn test_empty_view_total_is_zero() {
        let view = CartView::new(&empty_cart(), Vec::new());
        assert_eq!(view.total, Decimal::ZERO);
        assert!(view.items.is_empty());
    }
}
