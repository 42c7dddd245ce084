//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types. They serialize directly into API responses where the shapes match.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem, CartView};
pub use order::{Order, OrderItem, ShippingAddress};
pub use product::Product;
pub use review::Review;
pub use user::User;
