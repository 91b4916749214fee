//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness
//! GET    /health/ready           - Database readiness
//!
//! # Directory (ADMIN role, checked per request)
//! GET    /directory/users        - List with search, filters, pagination
//! POST   /directory/users        - Create a directory-only account
//! GET    /directory/users/{id}   - Account with orders and addresses
//! PUT    /directory/users/{id}   - Partial update
//! DELETE /directory/users/{id}   - Delete (cascades)
//!
//! # Identity provider
//! POST   /webhooks/identity      - Signed lifecycle events
//! ```

pub mod directory;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// All admin routes. Session and tracing layers are applied by the caller.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(directory::router(state))
        .merge(webhooks::router())
}
