//! Order summary arithmetic shown alongside the cart.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartLines;

/// Flat shipping charge in rupees.
pub const SHIPPING_CHARGE: Decimal = Decimal::ONE_HUNDRED;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(2999, 0, 0, false, 0);

/// Subtotal, shipping, and grand total for a set of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    /// How much more to spend for free shipping; `None` once it applies.
    pub amount_to_free_shipping: Option<Decimal>,
}

impl CheckoutSummary {
    #[must_use]
    pub fn for_subtotal(subtotal: Decimal) -> Self {
        if subtotal.is_zero() {
            return Self {
                subtotal,
                shipping: Decimal::ZERO,
                total: Decimal::ZERO,
                amount_to_free_shipping: Some(FREE_SHIPPING_THRESHOLD),
            };
        }

        let free = subtotal >= FREE_SHIPPING_THRESHOLD;
        let shipping = if free { Decimal::ZERO } else { SHIPPING_CHARGE };
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
            amount_to_free_shipping: (!free).then(|| FREE_SHIPPING_THRESHOLD - subtotal),
        }
    }

    #[must_use]
    pub fn for_cart(cart: &impl CartLines) -> Self {
        Self::for_subtotal(cart.total_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;

    #[test]
    fn charges_shipping_below_threshold() {
        let summary = CheckoutSummary::for_subtotal(Decimal::from(2998));
        assert_eq!(summary.shipping, Decimal::from(100));
        assert_eq!(summary.total, Decimal::from(3098));
        assert_eq!(summary.amount_to_free_shipping, Some(Decimal::ONE));
    }

    #[test]
    fn free_at_exactly_the_threshold() {
        let summary = CheckoutSummary::for_subtotal(Decimal::from(2999));
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::from(2999));
        assert_eq!(summary.amount_to_free_shipping, None);
    }

    #[test]
    fn empty_cart_owes_nothing() {
        let summary = CheckoutSummary::for_cart(&Cart::new());
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.shipping, Decimal::ZERO);
    }
}
