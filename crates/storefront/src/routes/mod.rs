//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Database readiness
//!
//! # Catalog
//! GET    /api/products                - Filtered, sorted, paged listing
//! GET    /api/products/{id}           - Product detail
//! GET    /api/categories              - Categories with product counts
//!
//! # Cart (session)
//! GET    /api/cart                    - Lines, totals, shipping summary
//! DELETE /api/cart                    - Empty the cart
//! POST   /api/cart/items              - Add a product
//! PATCH  /api/cart/items/{lineId}     - Set a line's quantity
//! DELETE /api/cart/items/{lineId}     - Remove a line
//!
//! # Account (requires identity)
//! GET    /api/account/profile         - Account, addresses, recent orders
//! ```

pub mod account;
pub mod cart;
pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// All storefront routes. Session and tracing layers are applied by the
/// caller.
pub fn routes() -> Router<AppState> {
    Router::new().merge(health::router()).merge(api_routes())
}

/// The `/api` routes, without health probes, so the caller can rate limit
/// them separately.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(cart::router())
        .merge(account::router())
}
