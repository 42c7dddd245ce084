//! Business logic services.
//!
//! Services own the multi-step flows (authentication, cart mutation,
//! checkout, review aggregation); simple single-query reads go straight
//! from the route handlers to the repositories.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod reviews;
pub mod stripe;

pub use auth::{AuthError, AuthService, TokenKind, TokenService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use reviews::{ReviewError, ReviewService};
pub use stripe::{StripeClient, StripeError};
