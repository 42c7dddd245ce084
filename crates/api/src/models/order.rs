//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{OrderId, OrderStatus, ProductId, UserId, round_money};

/// An immutable order snapshot created at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    /// Sum of item price x quantity over the snapshot, rounded to 2 places.
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    /// Opaque payment-processor reference for this order's charge.
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

/// An order line carrying a copy of the product's name and price at purchase
/// time, so later catalog edits never alter historical orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    /// Line total at the snapshot price.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Where to ship the order. Validated at the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub zip_code: String,
}

/// Total over a set of snapshot lines, rounded to 2 decimal places.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> Decimal {
    round_money(items.iter().map(OrderItem::subtotal).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Decimal, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            name: "widget".to_owned(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_order_total_single_line() {
        // 9.99 * 2 = 19.98
        let items = vec![item(Decimal::new(999, 2), 2)];
        assert_eq!(order_total(&items), Decimal::new(1998, 2));
    }

    #[test]
    fn test_order_total_multiple_lines() {
        let items = vec![
            item(Decimal::new(2999, 2), 2), // 59.98
            item(Decimal::new(4999, 2), 1), // 49.99
        ];
        assert_eq!(order_total(&items), Decimal::new(109_97, 2));
    }

    #[test]
    fn test_order_total_empty() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
