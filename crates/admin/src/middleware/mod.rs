//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Role gate (directory routes only, as a route layer)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{Actor, RoleGate, authorize, require_role, session_identity};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer};
