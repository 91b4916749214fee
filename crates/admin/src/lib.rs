//! Saakie Admin library.
//!
//! Serves the user directory API and receives identity provider webhooks.
//! Exposed as a library so routes and services can be tested without a
//! running server.
//!
//! # Security
//!
//! Directory routes require a session identity whose directory record holds
//! the `ADMIN` role. The webhook route is authenticated by signature only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
