//! HTTP route handlers.
//!
//! # Route Structure
//!
//! All routes are served under `/api/v1`:
//!
//! ```text
//! # Auth
//! POST /auth/register          - Create an account
//! POST /auth/login             - Log in, sets token cookies
//! POST /auth/logout            - Clear token cookies
//! POST /auth/refresh           - Exchange refresh cookie for a new access token
//! GET  /auth/me                - Current user
//!
//! # Catalog
//! GET  /products               - List with filtering/sorting/pagination
//! GET  /products/{id}          - Product detail
//! GET  /products/{id}/reviews  - Reviews, newest first
//! POST /products/{id}/reviews  - Create a review (auth)
//!
//! # Cart (auth)
//! GET    /cart                 - Cart joined with live product data
//! POST   /cart/items           - Add a product (merges quantities)
//! PUT    /cart/items/{id}      - Overwrite a line's quantity
//! DELETE /cart/items/{id}      - Remove a line
//!
//! # Checkout and orders (auth except webhook)
//! POST /orders/create-payment-intent - Price the cart, open a payment intent
//! POST /orders                 - Convert cart to a pending order
//! GET  /orders                 - Order history, newest first
//! POST /orders/stripe-webhook  - Signed payment events from Stripe
//!
//! # Admin (is_admin)
//! POST   /admin/products             - Create product
//! PUT    /admin/products/{id}        - Partial update
//! DELETE /admin/products/{id}        - Delete product
//! GET    /admin/orders               - All orders
//! PUT    /admin/orders/{id}/status   - Overwrite order status
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::list_reviews).post(products::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/create-payment-intent", post(orders::create_payment_intent))
        .route("/stripe-webhook", post(orders::stripe_webhook))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", put(admin::set_order_status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
}
