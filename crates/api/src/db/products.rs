//! Product repository: catalog listing, admin CRUD, and rating updates.
//!
//! Listing supports two mutually exclusive filter modes (category filter or
//! full-text search over name + description), a single sort key, and
//! skip/limit pagination.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use orchard_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Database row for a product.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    image_url: String,
    category: String,
    stock_quantity: i32,
    avg_rating: Decimal,
    review_count: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            category: row.category,
            stock_quantity: row.stock_quantity,
            avg_rating: row.avg_rating,
            review_count: row.review_count,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, category, \
     stock_quantity, avg_rating, review_count, created_at";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Most recently created first (the default).
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    const fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY created_at DESC",
            Self::PriceAsc => " ORDER BY price ASC",
            Self::PriceDesc => " ORDER BY price DESC",
        }
    }
}

/// Listing filter. `search` takes precedence over `category`; the two modes
/// are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub skip: i64,
    pub limit: i64,
}

/// New product fields for creation.
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    pub stock_quantity: i32,
}

/// Partial update for a product; `None` fields are left unchanged.
#[derive(Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: Option<i32>,
}

impl ProductPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category.is_none()
            && self.stock_quantity.is_none()
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List products with filtering, sorting, and pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));

        if let Some(search) = &filter.search {
            qb.push(
                " WHERE to_tsvector('english', name || ' ' || description) \
                 @@ plainto_tsquery('english', ",
            );
            qb.push_bind(search.clone());
            qb.push(")");
        } else if let Some(category) = &filter.category {
            qb.push(" WHERE category = ");
            qb.push_bind(category.clone());
        }

        qb.push(filter.sort.order_clause());
        qb.push(" LIMIT ");
        qb.push_bind(filter.limit);
        qb.push(" OFFSET ");
        qb.push_bind(filter.skip);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a new product (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, description, price, image_url, category, stock_quantity)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.image_url)
        .bind(&new.category)
        .bind(new.stock_quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update to a product (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        if patch.is_empty() {
            return self.get(id).await?.ok_or(RepositoryError::NotFound);
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE products SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = &patch.name {
            fields.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = patch.price {
            fields.push("price = ").push_bind_unseparated(price);
        }
        if let Some(image_url) = &patch.image_url {
            fields
                .push("image_url = ")
                .push_bind_unseparated(image_url.clone());
        }
        if let Some(category) = &patch.category {
            fields
                .push("category = ")
                .push_bind_unseparated(category.clone());
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            fields
                .push("stock_quantity = ")
                .push_bind_unseparated(stock_quantity);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {PRODUCT_COLUMNS}"));

        let row = qb
            .build_query_as::<ProductRow>()
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product (admin operation).
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite a product's denormalized rating aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_rating(
        &self,
        id: ProductId,
        avg_rating: Decimal,
        review_count: i32,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET avg_rating = $1, review_count = $2 WHERE id = $3")
                .bind(avg_rating)
                .bind(review_count)
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
