//! Cart and wishlist aggregation
//!
//! Cart state lives in an explicit [`CartStore`] passed by reference, not in
//! ambient globals. Mutation entry points sit on the store; the read side
//! ([`aggregate`]) is a pure fold through the pricing engine. The same store
//! type backs the wishlist, which adds subset previews and a bulk cart-add.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::product::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::pricing::compute_price;
use crate::domain::value_objects::{Money, Quantity};
use crate::Result;

/// One cart or wishlist line. `product` is optional because partial entries
/// arrive from display caches; aggregation skips them instead of failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: String,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl CartEntry {
    pub fn new(product: Product, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product: Some(product),
            quantity: Some(quantity),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CartTotals {
    pub base_total: Money,
    pub final_total: Money,
    pub savings: Money,
}

/// Fold entries through the pricing engine.
///
/// Entries without a product are skipped, absent quantities count as 1, and
/// the result is invariant under entry permutation (plain sums).
pub fn aggregate(entries: &[CartEntry]) -> CartTotals {
    let mut base_total = Money::ZERO;
    let mut final_total = Money::ZERO;

    for entry in entries {
        let product = match &entry.product {
            Some(p) => p,
            None => continue,
        };
        let qty = Quantity::resolve(entry.quantity);
        let priced = compute_price(product.base_price, product.promotion.as_ref());
        base_total = base_total + priced.base_price.multiply(qty.value());
        final_total = final_total + priced.final_price.multiply(qty.value());
    }

    CartTotals {
        base_total,
        final_total,
        savings: base_total.saturating_sub(final_total),
    }
}

/// Payload for one `create_cart_item` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItemPayload {
    pub product_id: String,
    pub quantity: u32,
}

/// Cart service collaborator. The bulk add issues one call per selected
/// entry and acknowledges the batch only if every call succeeds.
#[async_trait]
pub trait CartItemWriter: Send + Sync {
    async fn create_cart_item(&self, payload: &CartItemPayload) -> Result<()>;
}

/// Explicit cart/wishlist store, passed by reference to whichever view needs
/// it. Mutations raise [`CartEvent`]s collected with [`CartStore::take_events`].
#[derive(Debug, Default)]
pub struct CartStore {
    entries: Vec<CartEntry>,
    events: Vec<DomainEvent>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pure read accessor; display order never affects the figures.
    pub fn totals(&self) -> CartTotals {
        aggregate(&self.entries)
    }

    /// Totals over the subset identified by entry id, for previewing savings
    /// before a bulk cart-add.
    pub fn selection_totals(&self, ids: &[&str]) -> CartTotals {
        let selected: Vec<CartEntry> = self
            .entries
            .iter()
            .filter(|e| ids.contains(&e.id.as_str()))
            .cloned()
            .collect();
        aggregate(&selected)
    }

    pub fn add_entry(&mut self, entry: CartEntry) {
        let same_product = |existing: &&mut CartEntry| match (&existing.product, &entry.product) {
            (Some(a), Some(b)) => a.id == b.id,
            _ => false,
        };
        if let Some(existing) = self.entries.iter_mut().find(same_product) {
            let merged = Quantity::resolve(existing.quantity)
                .value()
                .saturating_add(Quantity::resolve(entry.quantity).value());
            existing.quantity = Some(merged);
            let entry_id = existing.id.clone();
            self.raise(CartEvent::QuantityChanged {
                entry_id,
                quantity: merged,
            });
            return;
        }
        self.raise(CartEvent::ItemAdded {
            entry_id: entry.id.clone(),
            product_id: entry.product.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
        });
        self.entries.push(entry);
    }

    /// Returns false when no entry has that id. Quantity 0 removes the line.
    pub fn set_quantity(&mut self, entry_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_entry(entry_id);
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) else {
            return false;
        };
        entry.quantity = Some(quantity);
        self.raise(CartEvent::QuantityChanged {
            entry_id: entry_id.to_string(),
            quantity,
        });
        true
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != entry_id);
        if self.entries.len() == before {
            return false;
        }
        self.raise(CartEvent::ItemRemoved {
            entry_id: entry_id.to_string(),
        });
        true
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.raise(CartEvent::Cleared);
        }
    }

    /// Push the selected entries to the remote cart, one request per entry.
    /// Fails on the first error so a partial batch is never acknowledged;
    /// returns the number of items pushed on success.
    pub async fn add_selected_to_cart(
        &self,
        ids: &[&str],
        writer: &dyn CartItemWriter,
    ) -> Result<usize> {
        let mut pushed = 0;
        for entry in self.entries.iter().filter(|e| ids.contains(&e.id.as_str())) {
            let product = match &entry.product {
                Some(p) => p,
                None => continue,
            };
            let payload = CartItemPayload {
                product_id: product.id.clone(),
                quantity: Quantity::resolve(entry.quantity).value(),
            };
            writer.create_cart_item(&payload).await?;
            pushed += 1;
        }
        Ok(pushed)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: CartEvent) {
        self.events.push(DomainEvent::Cart(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::Promotion;
    use crate::StorefrontError;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn plain(id: &str, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), Money::vnd(price))
    }

    fn discounted(id: &str, price: i64, fraction: &str) -> Product {
        plain(id, price).with_promotion(Promotion::percent_off(fraction.parse::<Decimal>().unwrap()))
    }

    #[test]
    fn test_totals_for_plain_cart() {
        let entries = vec![
            CartEntry::new(plain("P1", 100_000), 2),
            CartEntry::new(plain("P2", 50_000), 1),
        ];
        let totals = aggregate(&entries);
        assert_eq!(totals.base_total, Money::vnd(250_000));
        assert_eq!(totals.final_total, Money::vnd(250_000));
        assert_eq!(totals.savings, Money::ZERO);
    }

    #[test]
    fn test_totals_with_promotions() {
        let entries = vec![
            CartEntry::new(discounted("P1", 100_000, "0.2"), 2),
            CartEntry::new(plain("P2", 50_000), 1),
        ];
        let totals = aggregate(&entries);
        assert_eq!(totals.base_total, Money::vnd(250_000));
        assert_eq!(totals.final_total, Money::vnd(210_000));
        assert_eq!(totals.savings, Money::vnd(40_000));
    }

    #[test]
    fn test_totals_invariant_under_permutation() {
        let mut entries = vec![
            CartEntry::new(discounted("P1", 99_999, "0.15"), 3),
            CartEntry::new(plain("P2", 50_000), 1),
            CartEntry::new(discounted("P3", 75_000, "0.5"), 2),
        ];
        let forward = aggregate(&entries);
        entries.reverse();
        let backward = aggregate(&entries);
        assert_eq!(forward, backward);
        entries.swap(0, 1);
        assert_eq!(aggregate(&entries), forward);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let entries = vec![
            CartEntry {
                id: "orphan".into(),
                product: None,
                quantity: Some(5),
            },
            CartEntry::new(plain("P1", 10_000), 1),
        ];
        let totals = aggregate(&entries);
        assert_eq!(totals.base_total, Money::vnd(10_000));
    }

    #[test]
    fn test_missing_quantity_counts_as_one() {
        let entries = vec![CartEntry {
            id: "e1".into(),
            product: Some(plain("P1", 10_000)),
            quantity: None,
        }];
        assert_eq!(aggregate(&entries).final_total, Money::vnd(10_000));
    }

    #[test]
    fn test_store_merges_same_product() {
        let mut store = CartStore::new();
        store.add_entry(CartEntry::new(plain("P1", 10_000), 2));
        store.add_entry(CartEntry::new(plain("P1", 10_000), 1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.totals().final_total, Money::vnd(30_000));
    }

    #[test]
    fn test_store_mutations_raise_events() {
        let mut store = CartStore::new();
        store.add_entry(CartEntry::new(plain("P1", 10_000), 1));
        let id = store.entries()[0].id.clone();
        assert!(store.set_quantity(&id, 3));
        assert!(store.remove_entry(&id));
        assert!(!store.remove_entry(&id));
        store.clear(); // already empty, no event

        let events = store.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            DomainEvent::Cart(CartEvent::ItemAdded { .. })
        ));
        assert!(matches!(
            events[2],
            DomainEvent::Cart(CartEvent::ItemRemoved { .. })
        ));
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn test_selection_totals_previews_subset() {
        let mut store = CartStore::new();
        store.add_entry(CartEntry::new(discounted("P1", 100_000, "0.2"), 1));
        store.add_entry(CartEntry::new(plain("P2", 50_000), 2));
        let first = store.entries()[0].id.clone();

        let preview = store.selection_totals(&[first.as_str()]);
        assert_eq!(preview.base_total, Money::vnd(100_000));
        assert_eq!(preview.savings, Money::vnd(20_000));
        assert_eq!(store.selection_totals(&[]), CartTotals::default());
    }

    struct RecordingWriter {
        calls: AtomicUsize,
        fail_at: Option<usize>,
        payloads: Mutex<Vec<CartItemPayload>>,
    }

    impl RecordingWriter {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at,
                payloads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CartItemWriter for RecordingWriter {
        async fn create_cart_item(&self, payload: &CartItemPayload) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(n) {
                return Err(StorefrontError::CartWrite("service unavailable".into()));
            }
            self.payloads.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bulk_add_pushes_every_selected_entry() {
        let mut store = CartStore::new();
        store.add_entry(CartEntry::new(plain("P1", 10_000), 2));
        store.add_entry(CartEntry::new(plain("P2", 20_000), 1));
        let ids: Vec<String> = store.entries().iter().map(|e| e.id.clone()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let writer = RecordingWriter::new(None);
        let pushed = store.add_selected_to_cart(&refs, &writer).await.unwrap();
        assert_eq!(pushed, 2);
        let payloads = writer.payloads.lock().unwrap();
        assert_eq!(payloads[0].quantity, 2);
        assert_eq!(payloads[1].product_id, "P2");
    }

    #[tokio::test]
    async fn test_bulk_add_is_not_acknowledged_on_partial_failure() {
        let mut store = CartStore::new();
        store.add_entry(CartEntry::new(plain("P1", 10_000), 1));
        store.add_entry(CartEntry::new(plain("P2", 20_000), 1));
        let ids: Vec<String> = store.entries().iter().map(|e| e.id.clone()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let writer = RecordingWriter::new(Some(1));
        let result = store.add_selected_to_cart(&refs, &writer).await;
        assert!(matches!(result, Err(StorefrontError::CartWrite(_))));
        // first call went through, second failed, batch as a whole rejected
        assert_eq!(writer.calls.load(Ordering::SeqCst), 2);
    }
}
