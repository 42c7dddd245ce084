//! Order repository.
//!
//! Order creation is the one multi-table write in the system: stock
//! decrements, the order row, its item snapshot, and the cart clear all
//! happen in a single transaction so a failure on any line rolls the whole
//! checkout back.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use orchard_core::{CartId, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, ShippingAddress, order_total};

/// Errors from the transactional checkout write.
#[derive(Debug, Error)]
pub enum OrderCreateError {
    /// A cart line references a product that no longer exists.
    #[error("product {0} no longer exists")]
    ProductMissing(ProductId),

    /// A product has fewer units on hand than the cart requests.
    #[error("insufficient stock for {name}")]
    InsufficientStock { name: String },

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total_amount: Decimal,
    shipping_street: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip: String,
    status: String,
    payment_intent_id: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = OrderStatus::from_str(&self.status)
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total_amount: self.total_amount,
            shipping_address: ShippingAddress {
                street: self.shipping_street,
                city: self.shipping_city,
                state: self.shipping_state,
                zip_code: self.shipping_zip,
            },
            status,
            payment_intent_id: self.payment_intent_id,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    price: Decimal,
    quantity: i32,
}

const ORDER_COLUMNS: &str = "id, user_id, total_amount, shipping_street, shipping_city, \
     shipping_state, shipping_zip, status, payment_intent_id, created_at";

/// A quantity of a product to be purchased, at a snapshot price.
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Atomically convert a cart into an order.
    ///
    /// For each line the stock decrement is conditional on enough units being
    /// on hand, so concurrent checkouts can never drive stock negative. Item
    /// name and price are snapshotted from the product row inside the same
    /// transaction. On success the cart is emptied and the order is returned
    /// with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `OrderCreateError::ProductMissing` or
    /// `OrderCreateError::InsufficientStock` if any line cannot be fulfilled;
    /// nothing is written in that case. Returns `OrderCreateError::Database`
    /// if a query fails.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        cart_id: CartId,
        lines: &[PurchaseLine],
        shipping: &ShippingAddress,
        payment_intent_id: &str,
    ) -> Result<Order, OrderCreateError> {
        let mut tx = self.pool.begin().await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = Self::reserve_line(&mut tx, line).await?;
            items.push(item);
        }

        let total = order_total(&items);

        #[derive(sqlx::FromRow)]
        struct InsertedRow {
            id: OrderId,
            created_at: DateTime<Utc>,
        }

        let inserted = sqlx::query_as::<_, InsertedRow>(
            "INSERT INTO orders (user_id, total_amount, shipping_street, shipping_city,
                                 shipping_state, shipping_zip, payment_intent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, created_at",
        )
        .bind(user_id)
        .bind(total)
        .bind(&shipping.street)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.zip_code)
        .bind(payment_intent_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, price, quantity)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(inserted.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Order {
            id: inserted.id,
            user_id,
            items,
            total_amount: total,
            shipping_address: shipping.clone(),
            status: OrderStatus::Pending,
            payment_intent_id: payment_intent_id.to_owned(),
            created_at: inserted.created_at,
        })
    }

    /// Decrement stock for one line and return its snapshot, or fail the
    /// checkout if the product is gone or short on stock.
    async fn reserve_line(
        tx: &mut Transaction<'_, Postgres>,
        line: &PurchaseLine,
    ) -> Result<OrderItem, OrderCreateError> {
        #[derive(sqlx::FromRow)]
        struct SnapshotRow {
            name: String,
            price: Decimal,
        }

        let snapshot = sqlx::query_as::<_, SnapshotRow>(
            "UPDATE products SET stock_quantity = stock_quantity - $2
             WHERE id = $1 AND stock_quantity >= $2
             RETURNING name, price",
        )
        .bind(line.product_id)
        .bind(line.quantity)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(snapshot) = snapshot {
            return Ok(OrderItem {
                product_id: line.product_id,
                name: snapshot.name,
                price: snapshot.price,
                quantity: line.quantity,
            });
        }

        // Zero rows means either the product is gone or stock ran short;
        // look at the row to tell the two apart.
        let name =
            sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
                .bind(line.product_id)
                .fetch_optional(&mut **tx)
                .await?;

        match name {
            Some(name) => Err(OrderCreateError::InsufficientStock { name }),
            None => Err(OrderCreateError::ProductMissing(line.product_id)),
        }
    }

    /// Get one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items_by_order = self.items_for(&[row.id]).await?;
        let items = items_by_order.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(items)?))
    }

    /// All orders for a user, newest first, with items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// All orders in the system, newest first, with items (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Overwrite an order's status (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Transition every order on a payment intent from one status to another.
    ///
    /// The `from` guard makes webhook delivery idempotent: replays and
    /// out-of-order events match zero rows and are ignored.
    ///
    /// # Returns
    ///
    /// Returns the number of orders transitioned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition_by_payment_intent(
        &self,
        payment_intent_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1 WHERE payment_intent_id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(payment_intent_id)
        .bind(from.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items_by_order = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    async fn items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, price, quantity
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(raw_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(OrderItem {
                product_id: row.product_id,
                name: row.name,
                price: row.price,
                quantity: row.quantity,
            });
        }

        Ok(grouped)
    }
}
