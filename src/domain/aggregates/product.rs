//! Product summary consumed by pricing surfaces

use serde::{Deserialize, Serialize};

use crate::domain::pricing::Promotion;
use crate::domain::value_objects::Money;

/// The slice of a catalog product that pricing and aggregation need.
/// Catalog management (CRUD, images, inventory) lives outside this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub base_price: Money,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_price,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::compute_price;

    #[test]
    fn test_product_prices_identically_everywhere() {
        // Same product, same result, regardless of which surface asks.
        let p = Product::new("P1", "Ceramic mug", Money::vnd(120_000))
            .with_promotion(Promotion::amount_off(20_000));
        let card = compute_price(p.base_price, p.promotion.as_ref());
        let detail = compute_price(p.base_price, p.promotion.as_ref());
        assert_eq!(card, detail);
        assert_eq!(card.final_price, Money::vnd(100_000));
    }
}
