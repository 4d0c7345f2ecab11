//! Pricing Engine
//!
//! The one place that knows how a promotion turns a base price into a final
//! price. Every surface that shows a price (product card, detail page, cart
//! line, wishlist line) calls [`compute_price`] so the figures can never
//! drift apart between views.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;

/// Promotion descriptor attached to a product.
///
/// `value` is interpreted by magnitude: a fraction in `(0, 1]` is a
/// percentage discount (`1` inclusive means 100% off), anything above `1` is
/// a fixed VND amount. Zero or negative means no promotion. The boundary is
/// ambiguous by design and deliberately confined to this module; a future
/// discriminated kind only has to touch [`compute_price`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub value: Decimal,
}

impl Promotion {
    /// Percentage discount, e.g. `0.2` for 20% off.
    pub fn percent_off(fraction: Decimal) -> Self {
        Self { value: fraction }
    }

    /// Fixed VND discount.
    pub fn amount_off(amount: i64) -> Self {
        Self {
            value: Decimal::from(amount),
        }
    }

    fn is_active(&self) -> bool {
        self.value > Decimal::ZERO
    }

    fn is_percentage(&self) -> bool {
        self.value > Decimal::ZERO && self.value <= Decimal::ONE
    }
}

/// Everything a display surface needs to render one price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceResult {
    pub base_price: Money,
    pub final_price: Money,
    pub discount_amount: Money,
    pub discount_percent: u32,
    pub has_promotion: bool,
}

impl PriceResult {
    fn unchanged(base_price: Money) -> Self {
        Self {
            base_price,
            final_price: base_price,
            discount_amount: Money::ZERO,
            discount_percent: 0,
            has_promotion: false,
        }
    }
}

/// Compute the final price for a base price under an optional promotion.
///
/// Pure and deterministic. Invariants: `final_price >= 0`,
/// `discount_amount >= 0`, `final_price <= base_price`.
pub fn compute_price(base_price: Money, promotion: Option<&Promotion>) -> PriceResult {
    // Negative bases are display garbage, treated as zero.
    let base_price = Money::new(base_price.amount().max(Decimal::ZERO));

    let promo = match promotion {
        Some(p) if p.is_active() => p,
        _ => return PriceResult::unchanged(base_price),
    };

    if promo.is_percentage() {
        let final_price =
            Money::new(base_price.amount() * (Decimal::ONE - promo.value)).rounded();
        PriceResult {
            base_price,
            final_price,
            discount_amount: base_price.saturating_sub(final_price),
            discount_percent: round_percent(promo.value * Decimal::ONE_HUNDRED),
            has_promotion: true,
        }
    } else {
        let discount_amount = Money::new(promo.value);
        PriceResult {
            base_price,
            final_price: base_price.saturating_sub(discount_amount),
            discount_amount,
            discount_percent: discount_amount.percent_of(base_price),
            has_promotion: true,
        }
    }
}

fn round_percent(percent: Decimal) -> u32 {
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}
