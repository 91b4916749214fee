//! Storefront storage.
//!
//! The storefront reads the catalog (`categories`, `products`) and the
//! signed-in shopper's own directory records (`users`, `addresses`,
//! `orders`, `order_items`). It never writes to any of them; the cart lives
//! in the session store.
//!
//! Handlers talk to the [`CatalogStore`] and [`AccountStore`] trait objects
//! so routes can be tested against the in-memory stores in [`memory`].

pub mod accounts;
pub mod catalog;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use saakie_core::ExternalUserId;

use crate::models::{Category, Product, ProductFilter, ProductPage, Profile};

pub use accounts::PgAccountStore;
pub use catalog::PgCatalogStore;
pub use memory::{MemoryAccountStore, MemoryCatalogStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// One page of products matching `filter`.
    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError>;

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError>;

    /// All categories by name, with product counts.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
}

/// Read access to a shopper's own account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// The profile for `external_id`, or `None` if the identity has not been
    /// synced into the directory yet.
    async fn profile(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<Profile>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
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
