//! Helpers for black-box tests against running Saakie servers.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p saakie-cli -- migrate
//! cargo run -p saakie-admin &
//! cargo run -p saakie-storefront &
//!
//! # Directory tests need an admin session:
//! cargo run -p saakie-cli -- users set-role --email owner@saakie.in --role ADMIN
//! export SAAKIE_ADMIN_COOKIE=$(cargo run -q -p saakie-cli -- session issue --external-id <id>)
//!
//! cargo test -p saakie-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_BASE_URL` - Admin server (default `http://localhost:3001`)
//! - `STOREFRONT_BASE_URL` - Storefront server (default `http://localhost:3000`)
//! - `SAAKIE_ADMIN_COOKIE` - `saakie_session=...` for an `ADMIN` account
//! - `IDENTITY_WEBHOOK_SECRET` - The admin server's webhook signing secret

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;

/// Base URL for the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// The admin session cookie, if one was issued for this run.
#[must_use]
pub fn admin_cookie() -> Option<String> {
    std::env::var("SAAKIE_ADMIN_COOKIE")
        .ok()
        .filter(|c| !c.trim().is_empty())
}

/// A client that keeps cookies between requests.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique suffix so repeated runs do not collide on unique emails.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}
