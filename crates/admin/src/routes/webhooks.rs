//! Identity provider webhook.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use serde_json::{Value, json};
use tracing::{instrument, warn};

use crate::error::AppError;
use crate::identity::{
    IdentitySync, SignatureError, SyncOutcome, WebhookHeaders, event::USER_CREATED,
};
use crate::state::AppState;

/// Create webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/identity", post(identity_webhook))
}

/// Verify and apply one identity lifecycle event.
///
/// Nothing in the payload is looked at until the signature checks out.
#[instrument(skip(state, headers, body))]
async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let verifier = state
        .webhook_verifier()
        .ok_or_else(|| AppError::Internal("identity webhook secret not configured".into()))?;

    let headers = WebhookHeaders::from_header_map(&headers).map_err(|e| {
        warn!(error = %e, "identity webhook rejected");
        AppError::BadRequest("Missing webhook headers".into())
    })?;

    let event = verifier.verify(&body, &headers).map_err(|e| {
        warn!(error = %e, webhook_id = %headers.id, "identity webhook rejected");
        match e {
            SignatureError::Payload(_) => AppError::BadRequest("Invalid webhook payload".into()),
            _ => AppError::BadRequest("Invalid webhook signature".into()),
        }
    })?;

    let verb = if event.event_type == USER_CREATED {
        "created"
    } else {
        "updated"
    };
    match IdentitySync::new(state.users()).apply(event).await? {
        SyncOutcome::Upserted { account, .. } => Ok(Json(json!({
            "success": true,
            "message": format!("User {verb} successfully"),
            "userId": account.id,
        }))),
        SyncOutcome::Deleted(_) | SyncOutcome::Ignored(_) => Ok(Json(json!({ "received": true }))),
    }
}
