//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{aggregate, CartEntry, CartItemPayload, CartItemWriter, CartStore, CartTotals};
pub use order::{Order, PaymentMethod};
pub use product::Product;
