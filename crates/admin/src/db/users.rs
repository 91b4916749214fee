//! `PostgreSQL` implementation of [`UserStore`].
//!
//! Queries are built at runtime (`query_as` / `QueryBuilder`) because the
//! list filters are dynamic and the workspace builds without a live
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use saakie_core::{
    AddressId, Email, ExternalUserId, OrderId, OrderStatus, UserId, UserRole, UserStatus,
};

use super::{RepositoryError, UserStore, escape_like};
use crate::models::{
    Address, IdentityProfile, NewUser, OrderAggregates, OrderSummary, PageRequest, UserAccount,
    UserChanges, UserDetail, UserFilter, UserPage, UserSummary,
};

const USER_COLUMNS: &str =
    "u.id, u.external_id, u.name, u.email, u.phone, u.role, u.status, u.created_at, u.updated_at";

const RETURNING_USER: &str =
    " RETURNING id, external_id, name, email, phone, role, status, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    external_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    role: UserRole,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let external_id = ExternalUserId::parse(&row.external_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid external id in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            external_id,
            name: row.name,
            email,
            phone: row.phone,
            role: row.role,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    user: UserRow,
    order_count: i64,
    total_spent: Decimal,
}

impl TryFrom<SummaryRow> for UserSummary {
    type Error = RepositoryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            account: row.user.try_into()?,
            aggregates: OrderAggregates {
                order_count: row.order_count,
                total_spent: row.total_spent,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    user: UserRow,
    inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    order_count: i64,
    total_spent: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    total_amount: Decimal,
    status: OrderStatus,
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

impl From<OrderRow> for OrderSummary {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            total_amount: row.total_amount,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            country: row.country,
            is_default: row.is_default,
        }
    }
}

/// Map a write failure, turning unique violations into conflicts.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("users_external_id_key") => "external id is linked to another account",
            _ => "email already exists",
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR u.email ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(role) = filter.role {
        query.push(" AND u.role = ").push_bind(role);
    }
    if let Some(status) = filter.status {
        query.push(" AND u.status = ").push_bind(status);
    }
}

// =============================================================================
// Store
// =============================================================================

/// Directory store backed by the shared `PostgreSQL` database.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<UserPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS}, COUNT(o.id) AS order_count, \
             COALESCE(SUM(o.total_amount), 0) AS total_spent \
             FROM users u LEFT JOIN orders o ON o.user_id = u.id WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" GROUP BY u.id ORDER BY u.created_at DESC, u.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<SummaryRow> = query.build_query_as().fetch_all(&self.pool).await?;
        let users = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;

        Ok(UserPage {
            users,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn get_detail(&self, id: UserId) -> Result<Option<UserDetail>, RepositoryError> {
        let Some(account) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let aggregates = self.aggregates(id).await?;

        let orders = sqlx::query_as::<_, OrderRow>(
            "SELECT id, total_amount, status, created_at FROM orders \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderSummary::from)
        .collect();

        let addresses = sqlx::query_as::<_, AddressRow>(
            "SELECT id, line1, line2, city, state, pincode, country, is_default \
             FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

        Ok(Some(UserDetail {
            account,
            aggregates,
            orders,
            addresses,
        }))
    }

    async fn aggregates(&self, id: UserId) -> Result<OrderAggregates, RepositoryError> {
        let row = sqlx::query_as::<_, AggregateRow>(
            "SELECT COUNT(id) AS order_count, COALESCE(SUM(total_amount), 0) AS total_spent \
             FROM orders WHERE user_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderAggregates {
            order_count: row.order_count,
            total_spent: row.total_spent,
        })
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: &NewUser) -> Result<UserAccount, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (external_id, name, email, phone, role, status) \
             VALUES ($1, $2, $3, $4, $5, $6){RETURNING_USER}"
        ))
        .bind(&user.external_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<UserAccount>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(name) = &changes.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(email) = &changes.email {
            query.push(", email = ").push_bind(email.clone());
        }
        if let Some(phone) = &changes.phone {
            query.push(", phone = ").push_bind(phone.clone());
        }
        if let Some(role) = changes.role {
            query.push(", role = ").push_bind(role);
        }
        if let Some(status) = changes.status {
            query.push(", status = ").push_bind(status);
        }
        query.push(" WHERE id = ").push_bind(id).push(RETURNING_USER);

        let row: Option<UserRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, profile), fields(external_id = %profile.external_id))]
    async fn upsert_identity(
        &self,
        profile: &IdentityProfile,
    ) -> Result<(UserAccount, bool), RepositoryError> {
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            "INSERT INTO users (external_id, email, name, phone) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (external_id) DO UPDATE SET \
             email = EXCLUDED.email, name = EXCLUDED.name, phone = EXCLUDED.phone, \
             updated_at = now(){RETURNING_USER}, (xmax = 0) AS inserted"
        ))
        .bind(&profile.external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok((row.user.try_into()?, row.inserted))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
