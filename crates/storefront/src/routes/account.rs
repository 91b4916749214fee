//! The signed-in shopper's profile.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::{AppError, set_sentry_user};
use crate::middleware::RequireIdentity;
use crate::models::Profile;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/account/profile", get(profile))
}

/// Account, addresses, and recent orders.
///
/// 404 when the identity provider has not synced this shopper into the
/// directory yet.
#[instrument(skip_all)]
async fn profile(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<Profile>, AppError> {
    tracing::debug!(external_id = %identity.external_id, "loading profile");
    let profile = state
        .accounts()
        .profile(&identity.external_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    Ok(Json(profile))
}
