//! Core types for Saakie.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod external_id;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use external_id::{ExternalUserId, ExternalUserIdError};
pub use id::*;
pub use status::*;
