//! Persisted cart container.

use rust_decimal::Decimal;

use super::{Cart, CartLine, CartLineId, CartLines, CartSlot, PersistedCart, ProductRef};

/// A [`Cart`] bound to the slot it is saved in.
///
/// Every mutation updates memory first, then writes the whole cart back to
/// the slot before returning. Slot failures are logged and swallowed: from
/// the caller's point of view cart operations cannot fail.
#[derive(Debug)]
pub struct CartStore<S> {
    cart: Cart,
    slot: S,
}

impl<S: CartSlot> CartStore<S> {
    /// Restore the cart held in `slot`.
    ///
    /// An empty, unreadable, or unrecognised slot yields an empty cart.
    #[tracing::instrument(skip_all)]
    pub async fn open(slot: S) -> Self {
        let cart = match slot.load().await {
            Ok(Some(value)) => PersistedCart::restore(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding stored cart");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load cart, starting empty");
                Cart::new()
            }
        };
        Self { cart, slot }
    }

    /// See [`Cart::add_item`].
    pub async fn add_item(
        &mut self,
        product: ProductRef,
        quantity: u32,
        unit_price: Decimal,
    ) -> Option<CartLineId> {
        let id = self.cart.add_item(product, quantity, unit_price);
        self.persist().await;
        id
    }

    /// See [`Cart::remove_item`].
    pub async fn remove_item(&mut self, id: CartLineId) -> bool {
        let removed = self.cart.remove_item(id);
        self.persist().await;
        removed
    }

    /// See [`Cart::update_quantity`].
    pub async fn update_quantity(&mut self, id: CartLineId, quantity: i64) -> bool {
        let touched = self.cart.update_quantity(id, quantity);
        self.persist().await;
        touched
    }

    pub async fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    async fn persist(&self) {
        let value = match serde_json::to_value(PersistedCart::from(&self.cart)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode cart");
                return;
            }
        };
        if let Err(e) = self.slot.save(value).await {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }
}

impl<S> CartLines for CartStore<S> {
    fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cart::MemorySlot;

    #[tokio::test]
    async fn every_mutation_is_written_through() {
        let slot = MemorySlot::new();
        let mut store = CartStore::open(&slot).await;

        let id = store
            .add_item("p1".into(), 2, Decimal::from(100))
            .await
            .unwrap();
        assert_eq!(slot.snapshot().unwrap()["lines"][0]["quantity"], 2);

        store.update_quantity(id, 5).await;
        assert_eq!(slot.snapshot().unwrap()["lines"][0]["quantity"], 5);

        store.remove_item(id).await;
        assert_eq!(slot.snapshot().unwrap()["lines"], json!([]));
    }

    #[tokio::test]
    async fn reopening_restores_the_same_totals() {
        let slot = MemorySlot::new();
        let mut store = CartStore::open(&slot).await;
        store.add_item("p1".into(), 2, Decimal::from(100)).await;
        store.add_item("p1".into(), 1, Decimal::from(100)).await;
        store.add_item("p2".into(), 1, Decimal::new(2499, 0)).await;
        let expected = store.total_price();
        drop(store);

        let reopened = CartStore::open(&slot).await;
        assert_eq!(reopened.total_price(), expected);
        assert_eq!(reopened.total_items(), 4);
        assert_eq!(reopened.lines().len(), 2);
    }

    #[tokio::test]
    async fn replaying_the_same_adds_gives_the_same_total() {
        let adds = [("p1", 2, 100), ("p2", 1, 250), ("p1", 1, 100)];

        let slot = MemorySlot::new();
        let mut store = CartStore::open(&slot).await;
        for (p, q, price) in adds {
            store.add_item(p.into(), q, Decimal::from(price)).await;
        }
        let first = store.total_price();

        store.clear_cart().await;
        assert!(store.is_empty());
        for (p, q, price) in adds {
            store.add_item(p.into(), q, Decimal::from(price)).await;
        }
        assert_eq!(store.total_price(), first);
        assert_eq!(first, Decimal::from(550));
    }

    #[tokio::test]
    async fn write_failures_do_not_surface() {
        let mut store = CartStore::open(MemorySlot::read_only()).await;
        let id = store.add_item("p1".into(), 1, Decimal::from(10)).await;
        assert!(id.is_some());
        assert_eq!(store.total_items(), 1);
    }

    #[tokio::test]
    async fn garbage_in_the_slot_yields_an_empty_cart() {
        let slot = MemorySlot::with_value(json!({"version": 99, "lines": "nope"}));
        let store = CartStore::open(&slot).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn legacy_slot_is_upgraded_on_next_write() {
        let slot = MemorySlot::with_value(json!({
            "state": {"items": [{"id": "cart-1-0.5", "productId": "p1", "quantity": 1, "price": 100}]},
            "version": 0
        }));
        let mut store = CartStore::open(&slot).await;
        store.add_item("p1".into(), 1, Decimal::from(100)).await;

        let saved = slot.snapshot().unwrap();
        assert_eq!(saved["version"], 1);
        assert_eq!(saved["lines"][0]["quantity"], 2);
    }
}
