//! Shopping cart state.
//!
//! A [`Cart`] holds at most one [`CartLine`] per product. Adding a product
//! that is already present increments that line's quantity and keeps the
//! price captured on the first add.
//!
//! The cart is owned, never global: handlers build a [`CartStore`] around a
//! [`CartSlot`] for the current session, mutate it, and drop it. Read-only
//! consumers take the [`CartLines`] capability instead of the store.
//!
//! Stock limits are not enforced here. Callers that want them check a
//! separately fetched product record before calling [`CartStore::add_item`].

mod line;
mod persist;
mod store;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use line::{CartLine, CartLineId, ProductRef};
pub use persist::{
    CART_SCHEMA_VERSION, CART_SLOT, CartSlot, MemorySlot, MemorySlotError, PersistedCart,
    RestoreError,
};
pub use store::CartStore;

/// Read access to a set of cart lines.
///
/// Totals are recomputed on every call; carts are small.
pub trait CartLines {
    fn lines(&self) -> &[CartLine];

    fn line(&self, id: CartLineId) -> Option<&CartLine> {
        self.lines().iter().find(|line| line.id == id)
    }

    fn line_for_product(&self, product: &ProductRef) -> Option<&CartLine> {
        self.lines().iter().find(|line| &line.product_id == product)
    }

    fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Sum of quantities across all lines.
    fn total_items(&self) -> u64 {
        self.lines().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `quantity × unit_price` across all lines.
    fn total_price(&self) -> Decimal {
        self.lines().iter().map(CartLine::line_total).sum()
    }
}

/// In-memory cart with merge-on-add semantics. No persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` of `product`.
    ///
    /// Returns the id of the line that now holds the product, or `None` when
    /// `quantity` is zero (nothing changes).
    pub fn add_item(
        &mut self,
        product: ProductRef,
        quantity: u32,
        unit_price: Decimal,
    ) -> Option<CartLineId> {
        if quantity == 0 {
            return None;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Some(line.id);
        }

        let id = CartLineId::generate();
        self.lines.push(CartLine {
            id,
            product_id: product,
            quantity,
            unit_price,
        });
        Some(id)
    }

    /// Remove the line. Returns whether it was present.
    pub fn remove_item(&mut self, id: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Set a line's quantity. Zero or negative removes the line; values past
    /// `u32::MAX` saturate. Returns whether a line was touched.
    pub fn update_quantity(&mut self, id: CartLineId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        match self.lines.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Rebuild a cart from stored lines, re-applying merge-on-add so that a
    /// hand-edited or legacy payload cannot break the one-line-per-product
    /// rule. Zero-quantity lines are dropped.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }
}

impl CartLines for Cart {
    fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn repeated_adds_merge_into_one_line() {
        let mut cart = Cart::new();
        let a = cart.add_item("p1".into(), 2, price(100)).unwrap();
        let b = cart.add_item("p1".into(), 1, price(100)).unwrap();

        assert_eq!(a, b);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_price(), price(300));
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn merge_keeps_the_first_captured_price() {
        let mut cart = Cart::new();
        cart.add_item("silk-01".into(), 1, price(4500));
        cart.add_item("silk-01".into(), 1, price(3999));

        assert_eq!(cart.lines()[0].unit_price, price(4500));
        assert_eq!(cart.total_price(), price(9000));
    }

    #[test]
    fn quantity_sums_over_many_adds() {
        let mut cart = Cart::new();
        let requested = [1_u32, 4, 2, 7, 1];
        for q in requested {
            cart.add_item("p1".into(), q, price(10));
        }
        cart.add_item("p2".into(), 5, price(20));

        let p1 = cart.line_for_product(&"p1".into()).unwrap();
        assert_eq!(p1.quantity, requested.iter().sum::<u32>());
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn adding_zero_is_a_no_op() {
        let mut cart = Cart::new();
        assert!(cart.add_item("p1".into(), 0, price(10)).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn update_to_zero_matches_remove() {
        let mut by_update = Cart::new();
        let id = by_update.add_item("p1".into(), 2, price(50)).unwrap();
        by_update.add_item("p2".into(), 1, price(70));
        let mut by_remove = by_update.clone();

        assert!(by_update.update_quantity(id, 0));
        assert!(by_remove.remove_item(id));

        assert_eq!(by_update, by_remove);
        assert_eq!(by_update.total_items(), 1);
        assert!(by_update.line(id).is_none());
    }

    #[test]
    fn negative_quantity_removes() {
        let mut cart = Cart::new();
        let id = cart.add_item("p1".into(), 2, price(50)).unwrap();
        assert!(cart.update_quantity(id, -3));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_replaces_quantity_in_place() {
        let mut cart = Cart::new();
        let id = cart.add_item("p1".into(), 2, price(50)).unwrap();
        assert!(cart.update_quantity(id, 5));
        assert_eq!(cart.line(id).unwrap().quantity, 5);
        assert_eq!(cart.total_price(), price(250));
    }

    #[test]
    fn unknown_line_ids_are_ignored() {
        let mut cart = Cart::new();
        cart.add_item("p1".into(), 1, price(50));
        let before = cart.clone();

        let stranger = CartLineId::generate();
        assert!(!cart.update_quantity(stranger, 4));
        assert!(!cart.remove_item(stranger));
        assert_eq!(cart, before);
    }

    #[test]
    fn huge_quantities_saturate() {
        let mut cart = Cart::new();
        let id = cart.add_item("p1".into(), 1, price(1)).unwrap();
        cart.update_quantity(id, i64::MAX);
        assert_eq!(cart.line(id).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn clear_empties_everything() {
        let mut cart = Cart::new();
        cart.add_item("p1".into(), 1, price(1));
        cart.add_item("p2".into(), 1, price(1));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn from_lines_restores_the_merge_invariant() {
        let dup = |q| CartLine {
            id: CartLineId::generate(),
            product_id: "p1".into(),
            quantity: q,
            unit_price: price(100),
        };
        let cart = Cart::from_lines([dup(1), dup(2), dup(0)]);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn fractional_prices_total_exactly() {
        let mut cart = Cart::new();
        cart.add_item("p1".into(), 3, Decimal::new(129_950, 2));
        assert_eq!(cart.total_price(), Decimal::new(389_850, 2));
    }
}
