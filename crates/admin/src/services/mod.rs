//! Business logic services for admin.
//!
//! # Services
//!
//! - `directory` - Account listing, lookup, and administrative edits

pub mod directory;

pub use directory::{DirectoryError, UserDirectory};
