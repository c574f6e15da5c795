//! Domain types for the shop.
//!
//! These are the validated in-memory representations; raw database rows live
//! in the `db` module and are converted on the way out.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::Category;
pub use order::{Order, OrderItem, OrderUser};
pub use product::Product;
pub use user::{CurrentUser, User, UserView};
