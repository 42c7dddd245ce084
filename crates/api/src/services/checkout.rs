//! Checkout orchestration.
//!
//! The flow has three legs. `quote` prices the cart and opens a payment
//! intent without touching inventory. `finalize` converts the cart into an
//! order inside one transaction, decrementing stock as it goes. The webhook
//! handler then moves the order out of `pending` once the processor settles
//! the charge.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use orchard_core::{OrderStatus, ProductId, UserId, round_money, to_minor_units};

use crate::db::{
    CartRepository, OrderCreateError, OrderRepository, ProductRepository, PurchaseLine,
    RepositoryError,
};
use crate::models::cart::CartItem;
use crate::models::order::{Order, ShippingAddress};
use crate::models::Product;
use crate::services::stripe::{PaymentIntent, StripeClient, StripeError, WebhookEvent};

/// Settlement currency for all charges.
const CURRENCY: &str = "usd";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("product {0} no longer exists")]
    ProductMissing(ProductId),

    /// A product has fewer units on hand than the cart requests.
    #[error("insufficient stock for {name}")]
    InsufficientStock { name: String },

    /// Cart total doesn't convert to a whole number of cents.
    #[error("cart total cannot be charged")]
    UnchargeableTotal,

    /// Payment processor error.
    #[error("payment error: {0}")]
    Payment(#[from] StripeError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<OrderCreateError> for CheckoutError {
    fn from(e: OrderCreateError) -> Self {
        match e {
            OrderCreateError::ProductMissing(id) => Self::ProductMissing(id),
            OrderCreateError::InsufficientStock { name } => Self::InsufficientStock { name },
            OrderCreateError::Database(e) => Self::Repository(RepositoryError::Database(e)),
        }
    }
}

/// A priced cart with an open payment intent.
///
/// `total` is in the currency's standard unit (dollars); the intent's own
/// `amount` is the processor's minor-unit integer.
#[derive(Debug)]
pub struct Quote {
    pub intent: PaymentIntent,
    pub total: Decimal,
}

/// Validate each cart line against its live product and price the cart.
///
/// Every line's product must still exist, and current stock must cover the
/// requested quantity. The returned total is rounded to two decimal places.
fn price_quote(lines: &[(CartItem, Option<Product>)]) -> Result<Decimal, CheckoutError> {
    let mut total = Decimal::ZERO;
    for (item, product) in lines {
        let product = product
            .as_ref()
            .ok_or(CheckoutError::ProductMissing(item.product_id))?;
        if item.quantity > product.stock_quantity {
            return Err(CheckoutError::InsufficientStock {
                name: product.name.clone(),
            });
        }
        total += product.price * Decimal::from(item.quantity);
    }
    Ok(round_money(total))
}

/// Checkout orchestration service.
pub struct CheckoutService<'a> {
    carts: CartRepository<'a>,
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    stripe: &'a StripeClient,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: &'a StripeClient) -> Self {
        Self {
            carts: CartRepository::new(pool),
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            stripe,
        }
    }

    /// Price the cart at current product prices and open a payment intent.
    ///
    /// Reads only; stock and the cart are untouched, so a quote can be
    /// repeated freely while the customer hesitates. Every line is validated
    /// against the live product first, so a quote never opens an intent the
    /// later finalize step is bound to reject.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to charge.
    /// Returns `CheckoutError::ProductMissing` if a line's product has been
    /// deleted, or `CheckoutError::InsufficientStock` if stock can't cover a
    /// line's quantity.
    /// Returns `CheckoutError::Payment` if the processor rejects the intent.
    pub async fn quote(&self, user_id: UserId) -> Result<Quote, CheckoutError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let items = self.carts.items(cart.id).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self.products.get(item.product_id).await?;
            lines.push((item, product));
        }

        let total = price_quote(&lines)?;
        let amount_minor = to_minor_units(total).ok_or(CheckoutError::UnchargeableTotal)?;

        let intent = self
            .stripe
            .create_payment_intent(amount_minor, CURRENCY, user_id)
            .await?;

        info!(user_id = %user_id, amount_minor, intent = %intent.id, "payment intent created");
        Ok(Quote { intent, total })
    }

    /// Convert the cart into a pending order tied to a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order.
    /// Returns `CheckoutError::ProductMissing` or
    /// `CheckoutError::InsufficientStock` if any line can't be fulfilled;
    /// stock is untouched in that case.
    pub async fn finalize(
        &self,
        user_id: UserId,
        shipping: &ShippingAddress,
        payment_intent_id: &str,
    ) -> Result<Order, CheckoutError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let items = self.carts.items(cart.id).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines: Vec<PurchaseLine> = items
            .into_iter()
            .map(|item| PurchaseLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let order = self
            .orders
            .create_from_cart(user_id, cart.id, &lines, shipping, payment_intent_id)
            .await?;

        info!(user_id = %user_id, order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    /// Apply a verified payment event to the matching order.
    ///
    /// Success moves `pending` orders to `processing`; failure moves them to
    /// `cancelled`. Any other event type, or an event whose order has already
    /// left `pending`, is ignored. Replays are therefore harmless.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the status update fails.
    pub async fn apply_payment_event(&self, event: &WebhookEvent) -> Result<(), CheckoutError> {
        let target = match event.kind.as_str() {
            "payment_intent.succeeded" => OrderStatus::Processing,
            "payment_intent.payment_failed" => OrderStatus::Cancelled,
            _ => {
                info!(kind = %event.kind, "ignoring webhook event");
                return Ok(());
            }
        };

        let intent_id = &event.data.object.id;
        let updated = self
            .orders
            .transition_by_payment_intent(intent_id, OrderStatus::Pending, target)
            .await?;

        if updated == 0 {
            warn!(intent = %intent_id, kind = %event.kind, "payment event matched no pending order");
        } else {
            info!(intent = %intent_id, status = %target, updated, "order status updated");
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, name: &str, price: Decimal, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            price,
            image_url: String::new(),
            category: "Electronics".to_owned(),
            stock_quantity: stock,
            avg_rating: Decimal::ZERO,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    fn item(product_id: i32, quantity: i32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[test]
    fn test_price_quote_totals_in_dollars() {
        // 19.99 * 2 + 24.99 = 64.97
        let lines = vec![
            (item(1, 2), Some(product(1, "Headphones", Decimal::new(19_99, 2), 10))),
            (item(2, 1), Some(product(2, "Bottle", Decimal::new(24_99, 2), 5))),
        ];
        assert_eq!(price_quote(&lines).unwrap(), Decimal::new(64_97, 2));
    }

    #[test]
    fn test_price_quote_rejects_missing_product() {
        let lines = vec![
            (item(1, 1), Some(product(1, "Headphones", Decimal::ONE, 10))),
            (item(7, 1), None),
        ];
        assert!(matches!(
            price_quote(&lines),
            Err(CheckoutError::ProductMissing(id)) if id == ProductId::new(7)
        ));
    }

    #[test]
    fn test_price_quote_rejects_insufficient_stock() {
        // qty 5 against stock 3 must fail, not price 5 units.
        let lines = vec![(
            item(1, 5),
            Some(product(1, "Headphones", Decimal::new(19_99, 2), 3)),
        )];
        assert!(matches!(
            price_quote(&lines),
            Err(CheckoutError::InsufficientStock { name }) if name == "Headphones"
        ));
    }

    #[test]
    fn test_price_quote_allows_exact_stock() {
        let lines = vec![(
            item(1, 3),
            Some(product(1, "Headphones", Decimal::new(10_00, 2), 3)),
        )];
        assert_eq!(price_quote(&lines).unwrap(), Decimal::new(30_00, 2));
    }
}
