//! Storefront Core
//!
//! Pricing and payment reconciliation core for a retail storefront.
//!
//! ## Features
//! - Promotion-aware price computation (single source of truth for every
//!   price-displaying surface)
//! - Cart and wishlist aggregation
//! - Order payment reconciliation across cash, bank transfer and VNPAY
//!
//! The view layer, routing and raw HTTP clients live outside this crate;
//! external services are consumed through the async traits in [`reconcile`]
//! and [`domain::aggregates::cart`].

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod reconcile;

pub use config::ReconcileConfig;
pub use domain::aggregates::cart::{
    aggregate, CartEntry, CartItemPayload, CartItemWriter, CartStore, CartTotals,
};
pub use domain::aggregates::order::{Order, PaymentMethod};
pub use domain::aggregates::product::Product;
pub use domain::events::{CartEvent, DomainEvent, PaymentEvent};
pub use domain::pricing::{compute_price, PriceResult, Promotion};
pub use domain::value_objects::{Money, Quantity};
pub use reconcile::summary::{JsonFileOrderStore, MemoryOrderStore, OrderSummary, RecentOrderStore};
pub use reconcile::vnpay::{VnpayOutcome, VnpayReturn, VNPAY_SUCCESS_CODE};
pub use reconcile::{
    OrderDetails, OrderLookup, PaymentReconciler, ReconcileOutcome, ReconcileSession,
    ReconcileState, TransferLookup, TransferMatch,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("transfer lookup failed: {0}")]
    TransferLookup(String),

    #[error("cart item create failed: {0}")]
    CartWrite(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
