//! Saakie Storefront library.
//!
//! Serves the public catalog, the session cart, and the shopper's profile.
//! Exposed as a library so routes can be tested without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
