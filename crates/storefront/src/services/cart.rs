//! Session-backed cart persistence.
//!
//! The shopper's cart is stored whole under [`keys::CART`] in their
//! `tower-sessions` record, so it follows the session cookie and survives
//! restarts of the storefront.

use serde_json::Value;
use tower_sessions::Session;

use saakie_core::cart::{CartSlot, CartStore};
use saakie_core::session::keys;

/// A [`CartSlot`] stored in the request's session.
#[derive(Debug, Clone)]
pub struct SessionSlot {
    session: Session,
}

impl SessionSlot {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartSlot for SessionSlot {
    type Error = tower_sessions::session::Error;

    async fn load(&self) -> Result<Option<Value>, Self::Error> {
        self.session.get::<Value>(keys::CART).await
    }

    async fn save(&self, value: Value) -> Result<(), Self::Error> {
        self.session.insert(keys::CART, value).await
    }
}

/// The cart for the current request.
pub type SessionCart = CartStore<SessionSlot>;

/// Open the cart held in `session`.
pub async fn open(session: Session) -> SessionCart {
    CartStore::open(SessionSlot::new(session)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use saakie_core::cart::CartLines;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session(store: &Arc<MemoryStore>) -> Session {
        Session::new(None, store.clone(), None)
    }

    #[tokio::test]
    async fn cart_round_trips_through_the_session() {
        let session = session(&Arc::new(MemoryStore::default()));

        let mut cart = open(session.clone()).await;
        cart.add_item("banarasi-red".into(), 2, Decimal::from(4999))
            .await
            .unwrap();
        drop(cart);

        let stored: Value = session.get(keys::CART).await.unwrap().unwrap();
        assert_eq!(stored["version"], 1);

        let reopened = open(session).await;
        assert_eq!(reopened.total_items(), 2);
        assert_eq!(reopened.total_price(), Decimal::from(9998));
    }

    #[tokio::test]
    async fn overlapping_requests_keep_the_last_save() {
        let session = session(&Arc::new(MemoryStore::default()));

        let mut first = open(session.clone()).await;
        let mut second = open(session.clone()).await;
        first
            .add_item("banarasi-red".into(), 1, Decimal::from(4999))
            .await
            .unwrap();
        second
            .add_item("kanjivaram-gold".into(), 1, Decimal::from(8999))
            .await
            .unwrap();

        let reopened = open(session).await;
        assert_eq!(reopened.total_items(), 1);
        assert_eq!(reopened.total_price(), Decimal::from(8999));
    }

    #[tokio::test]
    async fn empty_session_has_an_empty_cart() {
        let cart = open(session(&Arc::new(MemoryStore::default()))).await;
        assert!(cart.is_empty());
    }
}
