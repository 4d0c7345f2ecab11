//! Value objects shared across the storefront core

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Monetary amount in whole VND.
///
/// Arithmetic stays exact in `Decimal`; [`Money::rounded`] snaps to whole
/// units (VND has no minor unit) with midpoint rounding away from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn vnd(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to whole VND, midpoint away from zero.
    pub fn rounded(self) -> Self {
        Self(self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Subtraction clamped at zero; monetary results never go negative.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(Decimal::ZERO))
    }

    pub fn multiply(self, qty: u32) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Whole-percent share of `base` this amount represents (0 when `base`
    /// is zero, avoiding the divide).
    pub fn percent_of(self, base: Money) -> u32 {
        if base.0.is_zero() {
            return 0;
        }
        (self.0 / base.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cart line quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Absent quantities count as a single unit.
    pub fn resolve(raw: Option<u32>) -> Self {
        Self(raw.unwrap_or(1))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(1)
    }
}
