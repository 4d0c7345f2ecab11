//! Domain events
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Payment(PaymentEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { entry_id: String, product_id: String },
    ItemRemoved { entry_id: String },
    QuantityChanged { entry_id: String, quantity: u32 },
    Cleared,
}

/// The single user notification a terminal payment state produces.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentEvent {
    Confirmed {
        order_code: String,
        amount: Money,
    },
    Expired {
        order_code: String,
    },
    Failed {
        order_code: Option<String>,
        message: String,
    },
}
