//! Versioned persistence for carts.
//!
//! A cart is saved whole, as a [`PersistedCart`] JSON envelope, into a
//! single named slot. Writes overwrite the previous value, so there is no
//! partial-write state to recover from.
//!
//! Version history:
//! - `0`: the untagged browser format
//!   `{"state":{"items":[{"id","productId","quantity","price"}]},"version":0}`
//! - `1`: `{"version":1,"lines":[{"id","productId","quantity","unitPrice"}]}`

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Cart, CartLine, CartLineId, CartLines, ProductRef};

/// Name of the slot a shopper's cart lives in.
pub const CART_SLOT: &str = "saakie-cart";

/// Version written by this build.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// The stored form of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    pub version: u32,
    pub lines: Vec<CartLine>,
}

impl From<&Cart> for PersistedCart {
    fn from(cart: &Cart) -> Self {
        Self {
            version: CART_SCHEMA_VERSION,
            lines: cart.lines().to_vec(),
        }
    }
}

/// Why a stored value could not be turned back into a cart.
#[derive(thiserror::Error, Debug)]
pub enum RestoreError {
    #[error("stored cart has no version tag")]
    MissingVersion,
    #[error("stored cart version {0} is not supported")]
    UnsupportedVersion(u64),
    #[error("stored cart is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct LegacyEnvelope {
    state: LegacyState,
}

#[derive(Deserialize)]
struct LegacyState {
    #[serde(default)]
    items: Vec<LegacyItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyItem {
    product_id: String,
    quantity: i64,
    price: Decimal,
}

impl PersistedCart {
    /// Decode a stored value, migrating older versions forward.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError`] when the value has no version, a version
    /// newer than [`CART_SCHEMA_VERSION`], or a body that does not match
    /// its version.
    pub fn restore(value: Value) -> Result<Cart, RestoreError> {
        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or(RestoreError::MissingVersion)?;

        match version {
            0 => {
                let legacy: LegacyEnvelope = serde_json::from_value(value)?;
                // Legacy ids were "cart-<millis>-<random>" strings; mint new ones.
                let lines = legacy.state.items.into_iter().filter_map(|item| {
                    let quantity = u32::try_from(item.quantity).ok()?;
                    Some(CartLine {
                        id: CartLineId::generate(),
                        product_id: ProductRef::new(item.product_id),
                        quantity,
                        unit_price: item.price,
                    })
                });
                Ok(Cart::from_lines(lines))
            }
            1 => {
                let stored: Self = serde_json::from_value(value)?;
                Ok(Cart::from_lines(stored.lines))
            }
            other => Err(RestoreError::UnsupportedVersion(other)),
        }
    }
}

/// A durable location holding one serialized cart.
///
/// Implementations overwrite the whole value on every save.
pub trait CartSlot: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the stored value, if any.
    fn load(&self) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Replace the stored value.
    fn save(&self, value: Value) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(thiserror::Error, Debug)]
#[error("memory slot rejected the write")]
pub struct MemorySlotError;

/// Process-local slot, for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: RwLock<Option<Value>>,
    reject_writes: bool,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `value`.
    #[must_use]
    pub fn with_value(value: Value) -> Self {
        Self {
            value: RwLock::new(Some(value)),
            reject_writes: false,
        }
    }

    /// A slot whose saves always fail.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            value: RwLock::new(None),
            reject_writes: true,
        }
    }

    /// The currently stored value.
    #[must_use]
    pub fn snapshot(&self) -> Option<Value> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartSlot for MemorySlot {
    type Error = MemorySlotError;

    async fn load(&self) -> Result<Option<Value>, Self::Error> {
        Ok(self.snapshot())
    }

    async fn save(&self, value: Value) -> Result<(), Self::Error> {
        if self.reject_writes {
            return Err(MemorySlotError);
        }
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
        Ok(())
    }
}

impl<T: CartSlot> CartSlot for &T {
    type Error = T::Error;

    fn load(&self) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send {
        (**self).load()
    }

    fn save(&self, value: Value) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).save(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn writes_the_current_version() {
        let mut cart = Cart::new();
        cart.add_item("p1".into(), 2, Decimal::from(100));
        let value = serde_json::to_value(PersistedCart::from(&cart)).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["lines"][0]["productId"], "p1");
        assert_eq!(value["lines"][0]["quantity"], 2);
    }

    #[test]
    fn restores_current_version_verbatim() {
        let mut cart = Cart::new();
        cart.add_item("p1".into(), 2, Decimal::from(100));
        cart.add_item("p2".into(), 1, Decimal::new(2499, 0));
        let value = serde_json::to_value(PersistedCart::from(&cart)).unwrap();

        assert_eq!(PersistedCart::restore(value).unwrap(), cart);
    }

    #[test]
    fn migrates_the_legacy_browser_format() {
        let legacy = json!({
            "state": {
                "items": [
                    {"id": "cart-1700000000000-0.42", "productId": "p1", "quantity": 2, "price": 100},
                    {"id": "cart-1700000000001-0.17", "productId": "p2", "quantity": 1, "price": 1299.5},
                    {"id": "cart-1700000000002-0.99", "productId": "p3", "quantity": 0, "price": 10}
                ]
            },
            "version": 0
        });

        let cart = PersistedCart::restore(legacy).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Decimal::new(14_995, 1));
    }

    #[test]
    fn rejects_future_versions() {
        let value = json!({"version": 7, "lines": []});
        assert!(matches!(
            PersistedCart::restore(value),
            Err(RestoreError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn rejects_untagged_values() {
        assert!(matches!(
            PersistedCart::restore(json!({"lines": []})),
            Err(RestoreError::MissingVersion)
        ));
    }

    #[test]
    fn rejects_bodies_that_do_not_match_their_version() {
        let value = json!({"version": 1, "lines": [{"productId": 5}]});
        assert!(matches!(
            PersistedCart::restore(value),
            Err(RestoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn memory_slot_round_trips_values() {
        let slot = MemorySlot::new();
        assert!(slot.load().await.unwrap().is_none());

        slot.save(json!({"version": 1, "lines": []})).await.unwrap();
        assert_eq!(slot.load().await.unwrap().unwrap()["version"], 1);
    }

    #[tokio::test]
    async fn read_only_slot_refuses_saves() {
        let slot = MemorySlot::read_only();
        assert!(slot.save(json!({})).await.is_err());
        assert!(slot.snapshot().is_none());
    }
}
