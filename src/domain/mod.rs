//! Domain model: pricing, cart/wishlist aggregation, orders and events
pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod value_objects;
