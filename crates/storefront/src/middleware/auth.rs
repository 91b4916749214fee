//! Identity extractors.
//!
//! The session carries only the identity provider's external id. Whether
//! that identity has a directory account is up to the handler.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use saakie_core::session::{CurrentIdentity, keys};

use crate::error::AppError;

async fn current_identity(parts: &Parts) -> Result<Option<CurrentIdentity>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    session
        .get::<CurrentIdentity>(keys::CURRENT_IDENTITY)
        .await
        .map_err(|e| AppError::Internal(format!("session store: {e}")))
}

/// Extractor that requires a signed-in shopper.
///
/// Rejects with `401 {"error": "Unauthorized"}` when the session has no
/// identity, and with a 500 when the session store cannot be read.
///
/// ```rust,ignore
/// async fn handler(RequireIdentity(identity): RequireIdentity) -> String {
///     identity.external_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireIdentity(pub CurrentIdentity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(parts)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }
}
