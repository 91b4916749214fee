//! Directory accounts and the records surfaced alongside them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use saakie_core::{
    AddressId, Email, ExternalUserId, OrderId, OrderStatus, UserId, UserRole, UserStatus,
};

/// A directory account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: UserId,
    pub external_id: ExternalUserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order totals computed at read time. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregates {
    pub order_count: i64,
    pub total_spent: Decimal,
}

/// A list row: the account plus its aggregates, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub account: UserAccount,
    #[serde(flatten)]
    pub aggregates: OrderAggregates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub is_default: bool,
}

/// One account with its orders (newest first) and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub account: UserAccount,
    #[serde(flatten)]
    pub aggregates: OrderAggregates,
    pub orders: Vec<OrderSummary>,
    pub addresses: Vec<Address>,
}

/// List filters. `None` means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp `page` to at least 1 and `limit` to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// `ceil(total / limit)`, which is 0 for an empty result.
    #[must_use]
    pub fn total_pages(self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of list results and the count of all matching rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: u64,
}

/// Fields for a new account. Role and status already defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub external_id: ExternalUserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
}

/// A partial update. `None` leaves the column alone; `phone: Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UserChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.status.is_none()
    }
}

/// The identity provider's view of a person, as mirrored into the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub external_id: ExternalUserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(
            PageRequest::new(Some(0), Some(0)),
            PageRequest { page: 1, limit: 1 }
        );
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, 100);
    }

    #[test]
    fn offset_starts_at_zero() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).offset(), 0);
        assert_eq!(PageRequest::new(Some(4), Some(25)).offset(), 75);
    }

    #[test]
    fn total_pages_is_the_ceiling() {
        for limit in 1..=12_u32 {
            let page = PageRequest::new(None, Some(limit));
            for total in 0..=40_u64 {
                let expected = (total + u64::from(limit) - 1) / u64::from(limit);
                assert_eq!(page.total_pages(total), expected, "{total}/{limit}");
            }
        }
        assert_eq!(PageRequest::default().total_pages(0), 0);
    }

    #[test]
    fn empty_changes() {
        assert!(UserChanges::default().is_empty());
        let clear_phone = UserChanges {
            phone: Some(None),
            ..UserChanges::default()
        };
        assert!(!clear_phone.is_empty());
    }
}
