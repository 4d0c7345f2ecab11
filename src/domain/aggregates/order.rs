//! Order handed from checkout to payment reconciliation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::Money;

/// A pending order as the reconciliation controller sees it: created by
/// checkout, read-only here, immutable for the lifetime of one payment
/// attempt. `final_amount` is the checkout total produced by the pricing
/// engine upstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_code: String,
    pub final_amount: Money,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_code: impl Into<String>,
        final_amount: Money,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            order_code: order_code.into(),
            final_amount,
            payment_method,
            created_at: Utc::now(),
        }
    }
}

/// The three disjoint payment channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settled at delivery; confirmed manually, never polled.
    Cash,
    /// Bank-transfer QR; confirmed by polling the transfer-matching service.
    BankTransfer,
    /// Redirect to the VNPAY payment page; confirmed by the return callback.
    Vnpay,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Vnpay => write!(f, "vnpay"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        let back: PaymentMethod = serde_json::from_str("\"vnpay\"").unwrap();
        assert_eq!(back, PaymentMethod::Vnpay);
    }

    #[test]
    fn test_order_round_trip() {
        let order = Order::new("240815123456", Money::vnd(250_000), PaymentMethod::Cash);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
