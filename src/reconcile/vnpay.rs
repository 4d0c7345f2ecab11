//! VNPAY return-callback handling
//!
//! The browser comes back from the VNPAY payment page with a query string.
//! The response code alone decides success or failure; the freeform order
//! info is only best-effort enrichment, and the order service remains the
//! source of truth when it can be reached.

use crate::domain::events::{DomainEvent, PaymentEvent};
use crate::domain::value_objects::Money;

use super::summary::{OrderSummary, RecentOrderStore};
use super::OrderLookup;

/// Response code VNPAY sends on a completed payment.
pub const VNPAY_SUCCESS_CODE: &str = "00";

/// Parameters carried on the return URL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VnpayReturn {
    pub response_code: String,
    pub order_info: Option<String>,
    pub message: Option<String>,
}

impl VnpayReturn {
    /// Parse the return query string. Unknown parameters are ignored and a
    /// missing response code parses as an empty (failing) code.
    pub fn from_query(query: &str) -> Self {
        let mut ret = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, raw) = match pair.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            let value = decode_component(raw);
            match key {
                "vnp_ResponseCode" => ret.response_code = value,
                "vnp_OrderInfo" => ret.order_info = Some(value),
                "vnp_Message" | "message" => ret.message = Some(value),
                _ => {}
            }
        }
        ret
    }
}

/// Decode one query component. The return URL form-encodes spaces as `+`,
/// which [`urlencoding::decode`] leaves alone, so those are substituted
/// first; a literal plus arrives as `%2B` and still decodes correctly.
/// Undecodable input is kept as-is; this is display data, not a protocol
/// field.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Best-effort extraction of a numeric order code from the freeform order
/// info ("Thanh toan don hang 123456" -> "123456"): first contiguous digit
/// run. Lossy by nature; callers treat the result as enrichment only.
pub fn extract_order_code(info: &str) -> Option<String> {
    let start = info.find(|c: char| c.is_ascii_digit())?;
    let digits: String = info[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some(digits)
}

#[derive(Clone, Debug, PartialEq)]
pub enum VnpayOutcome {
    Success(OrderSummary),
    Failure { message: String },
}

impl VnpayOutcome {
    /// The single user notification for this outcome.
    pub fn notification(&self) -> DomainEvent {
        match self {
            VnpayOutcome::Success(summary) => DomainEvent::Payment(PaymentEvent::Confirmed {
                order_code: summary.order_code.clone(),
                amount: summary.final_amount,
            }),
            VnpayOutcome::Failure { message } => DomainEvent::Payment(PaymentEvent::Failed {
                order_code: None,
                message: message.clone(),
            }),
        }
    }
}

/// Resolve a VNPAY return callback.
///
/// Any response code other than [`VNPAY_SUCCESS_CODE`] is a failure routed
/// back to the cart; no extraction or fetch is attempted. On success the
/// authoritative summary comes from one order-service fetch; a failed fetch
/// is tolerated and the flow still lands on the success screen with whatever
/// the info string yielded.
pub async fn handle_return(
    ret: &VnpayReturn,
    orders: &dyn OrderLookup,
    summaries: &dyn RecentOrderStore,
) -> VnpayOutcome {
    if ret.response_code != VNPAY_SUCCESS_CODE {
        let message = ret
            .message
            .clone()
            .unwrap_or_else(|| format!("Payment failed (code {})", ret.response_code));
        tracing::info!(code = %ret.response_code, "vnpay payment failed");
        return VnpayOutcome::Failure { message };
    }

    let extracted = ret.order_info.as_deref().and_then(extract_order_code);
    let summary = match &extracted {
        Some(code) => match orders.get_order_by_code(code).await {
            Ok(details) => OrderSummary {
                order_code: details.order_code,
                final_amount: details.final_amount,
            },
            Err(e) => {
                tracing::warn!(
                    order_code = %code,
                    error = %e,
                    "order fetch failed after vnpay success, proceeding without details"
                );
                OrderSummary {
                    order_code: code.clone(),
                    final_amount: Money::ZERO,
                }
            }
        },
        None => {
            tracing::warn!("no order code in vnpay order info, proceeding without details");
            OrderSummary {
                order_code: String::new(),
                final_amount: Money::ZERO,
            }
        }
    };

    if let Err(e) = summaries.save(&summary) {
        tracing::warn!(error = %e, "failed to persist recent order summary");
    }
    tracing::info!(order_code = %summary.order_code, "vnpay payment confirmed");
    VnpayOutcome::Success(summary)
}
