//! The signed-in shopper's own records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use saakie_core::{
    AddressId, Email, OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId, UserRole,
};

/// Number of recent orders shown on the profile.
pub const RECENT_ORDER_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAddress {
    pub id: AddressId,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOrder {
    pub id: OrderId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub member_since: DateTime<Utc>,
    pub addresses: Vec<AccountAddress>,
    pub recent_orders: Vec<AccountOrder>,
}
