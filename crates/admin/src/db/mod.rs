//! Directory storage.
//!
//! # Tables (shared `saakie` database)
//!
//! - `users` - Directory accounts, unique on `email` and `external_id`
//! - `addresses` - Shipping addresses, `ON DELETE CASCADE` from `users`
//! - `orders` / `order_items` - Read-only here, cascade from `users`
//! - `tower_sessions.session` - Session store shared with the storefront
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p saakie-cli -- migrate
//! ```
//!
//! Handlers talk to a [`UserStore`] trait object so that services can be
//! exercised against [`MemoryUserStore`] without a database.

pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use saakie_core::{Email, ExternalUserId, UserId};

use crate::models::{
    IdentityProfile, NewUser, OrderAggregates, PageRequest, UserAccount, UserChanges, UserDetail,
    UserFilter, UserPage,
};

pub use memory::MemoryUserStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (email or external id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for directory accounts.
///
/// Each method is a single storage operation; implementations must enforce
/// email and external-id uniqueness themselves and report violations as
/// [`RepositoryError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// One page of accounts matching `filter`, newest first, with aggregates.
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<UserPage, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError>;

    async fn get_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserAccount>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError>;

    /// Account with orders (newest first), addresses, and aggregates.
    async fn get_detail(&self, id: UserId) -> Result<Option<UserDetail>, RepositoryError>;

    async fn aggregates(&self, id: UserId) -> Result<OrderAggregates, RepositoryError>;

    async fn insert(&self, user: &NewUser) -> Result<UserAccount, RepositoryError>;

    /// Apply `changes`. Returns `None` if the account does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<UserAccount>, RepositoryError>;

    /// Delete the account and everything that cascades from it. Returns
    /// whether a row was removed.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// Create-or-update keyed by external id. Returns the stored account and
    /// whether it was newly created. New accounts get the default role and
    /// status; existing accounts keep theirs.
    async fn upsert_identity(
        &self,
        profile: &IdentityProfile,
    ) -> Result<(UserAccount, bool), RepositoryError>;

    async fn delete_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_`, and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralises_wildcards() {
        assert_eq!(escape_like("priya"), "priya");
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
