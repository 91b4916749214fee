//! `PostgreSQL` implementation of [`AccountStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use saakie_core::{
    AddressId, Email, ExternalUserId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId,
    UserRole,
};

use super::{AccountStore, RepositoryError};
use crate::models::account::RECENT_ORDER_LIMIT;
use crate::models::{AccountAddress, AccountOrder, Profile};

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    role: UserRole,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i64,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    pincode: String,
    country: String,
    is_default: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    total_amount: Decimal,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    tracking_number: Option<String>,
    item_count: i64,
    created_at: DateTime<Utc>,
}

/// Profile reads over the shared pool.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[tracing::instrument(skip(self), fields(external_id = %external_id))]
    async fn profile(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<Profile>, RepositoryError> {
        let Some(account) = sqlx::query_as::<_, AccountRow>(
            "SELECT id, name, email, phone, role, created_at FROM users WHERE external_id = $1",
        )
        .bind(external_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let addresses = sqlx::query_as::<_, AddressRow>(
            "SELECT id, line1, line2, city, state, pincode, country, is_default \
             FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, id ASC",
        )
        .bind(account.id)
        .fetch_all(&self.pool)
        .await?;

        let orders = sqlx::query_as::<_, OrderRow>(
            "SELECT o.id, o.total_amount, o.status, o.payment_method, o.payment_status, \
             o.tracking_number, COUNT(i.id) AS item_count, o.created_at \
             FROM orders o LEFT JOIN order_items i ON i.order_id = o.id \
             WHERE o.user_id = $1 GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC LIMIT $2",
        )
        .bind(account.id)
        .bind(RECENT_ORDER_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let email = Email::parse(&account.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some(Profile {
            id: UserId::new(account.id),
            name: account.name,
            email,
            phone: account.phone,
            role: account.role,
            member_since: account.created_at,
            addresses: addresses
                .into_iter()
                .map(|row| AccountAddress {
                    id: AddressId::new(row.id),
                    line1: row.line1,
                    line2: row.line2,
                    city: row.city,
                    state: row.state,
                    pincode: row.pincode,
                    country: row.country,
                    is_default: row.is_default,
                })
                .collect(),
            recent_orders: orders
                .into_iter()
                .map(|row| AccountOrder {
                    id: OrderId::new(row.id),
                    total_amount: row.total_amount,
                    status: row.status,
                    payment_method: row.payment_method,
                    payment_status: row.payment_status,
                    tracking_number: row.tracking_number,
                    item_count: row.item_count,
                    created_at: row.created_at,
                })
                .collect(),
        }))
    }
}
