//! Saakie Core - shared types and the shopping cart store.
//!
//! This crate is used by every Saakie component:
//! - `storefront` - Public catalog, cart, and account API
//! - `admin` - User directory and identity sync
//! - `cli` - Migrations and directory bootstrap
//!
//! # Architecture
//!
//! The core crate performs no network or database I/O of its own. The cart
//! store persists through the [`cart::CartSlot`] trait, so the storefront can
//! back it with a session while tests use [`cart::MemorySlot`].
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, external identity IDs, and status enums
//! - [`cart`] - Cart lines, merge-on-add semantics, and versioned persistence
//! - [`catalog`] - Catalog paging and sort options
//! - [`checkout`] - Shipping charge and order summary arithmetic
//! - [`session`] - Identity and cart keys shared through the session store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod session;
pub mod types;

pub use types::*;
