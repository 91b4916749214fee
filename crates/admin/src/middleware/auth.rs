//! Role gate for directory routes.
//!
//! The session only carries the caller's external id. Their role is read
//! from the directory on every request, so a demotion takes effect on the
//! next call rather than at session expiry.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;
use tracing::instrument;

use saakie_core::UserRole;
use saakie_core::session::{CurrentIdentity, keys};

use crate::db::UserStore;
use crate::error::{AppError, set_sentry_user};
use crate::models::UserAccount;
use crate::state::AppState;

/// The authenticated account making a gated request.
#[derive(Debug, Clone)]
pub struct Actor(pub UserAccount);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }
}

/// State for [`require_role`]: the app state plus the role the route needs.
#[derive(Clone)]
pub struct RoleGate {
    state: AppState,
    required: UserRole,
}

impl RoleGate {
    #[must_use]
    pub const fn new(state: AppState, required: UserRole) -> Self {
        Self { state, required }
    }
}

/// Resolve the caller and check their current role.
///
/// # Errors
///
/// - `AppError::Unauthorized` when the session carries no identity
/// - `AppError::Forbidden` when the identity has no directory account or
///   its role is not `required`
pub async fn authorize(
    store: &dyn UserStore,
    identity: Option<CurrentIdentity>,
    required: UserRole,
) -> Result<UserAccount, AppError> {
    let identity = identity.ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    store
        .get_by_external_id(&identity.external_id)
        .await?
        .filter(|account| account.role == required)
        .ok_or_else(|| AppError::Forbidden("Forbidden".to_string()))
}

/// Read the caller's identity from the session.
///
/// # Errors
///
/// Returns `AppError::Internal` when the session store cannot be read.
pub async fn session_identity(session: &Session) -> Result<Option<CurrentIdentity>, AppError> {
    session
        .get::<CurrentIdentity>(keys::CURRENT_IDENTITY)
        .await
        .map_err(|e| AppError::Internal(format!("session store: {e}")))
}

/// Route layer requiring the caller to hold the gate's role.
///
/// Apply with `axum::middleware::from_fn_with_state(RoleGate::new(..), require_role)`.
///
/// # Errors
///
/// See [`authorize`].
#[instrument(skip_all)]
pub async fn require_role(
    State(gate): State<RoleGate>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = session_identity(&session).await?;
    let account = authorize(gate.state.users(), identity, gate.required).await?;
    set_sentry_user(&account);
    tracing::debug!(user_id = %account.id, "actor authorized");

    request.extensions_mut().insert(Actor(account));
    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use saakie_core::{Email, ExternalUserId, UserStatus};
    use tower_sessions::session::{Id, Record};
    use tower_sessions::{SessionStore, session_store};

    use super::*;
    use crate::db::MemoryUserStore;
    use crate::models::{NewUser, UserChanges};

    async fn account(store: &MemoryUserStore, external_id: &str, role: UserRole) -> UserAccount {
        store
            .insert(&NewUser {
                external_id: ExternalUserId::parse(external_id).unwrap(),
                name: "Asha".to_string(),
                email: Email::parse(&format!("{external_id}@saakie.in")).unwrap(),
                phone: None,
                role,
                status: UserStatus::Active,
            })
            .await
            .unwrap()
    }

    fn identity(external_id: &str) -> Option<CurrentIdentity> {
        Some(CurrentIdentity {
            external_id: ExternalUserId::parse(external_id).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_no_identity_is_unauthorized() {
        let store = MemoryUserStore::new();
        let result = authorize(&store, None, UserRole::Admin).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_unknown_identity_is_forbidden() {
        let store = MemoryUserStore::new();
        let result = authorize(&store, identity("user_ghost"), UserRole::Admin).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let store = MemoryUserStore::new();
        account(&store, "user_manager", UserRole::Manager).await;
        let result = authorize(&store, identity("user_manager"), UserRole::Admin).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_role_is_reread_each_time() {
        let store = MemoryUserStore::new();
        let admin = account(&store, "user_admin", UserRole::Admin).await;

        let actor = authorize(&store, identity("user_admin"), UserRole::Admin)
            .await
            .unwrap();
        assert_eq!(actor.id, admin.id);

        let demote = UserChanges {
            role: Some(UserRole::Customer),
            ..UserChanges::default()
        };
        store.update(admin.id, &demote).await.unwrap();

        let result = authorize(&store, identity("user_admin"), UserRole::Admin).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[derive(Debug, Clone)]
    struct UnreachableStore;

    #[async_trait]
    impl SessionStore for UnreachableStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_session_store_failure_is_internal() {
        let session = Session::new(Some(Id::default()), Arc::new(UnreachableStore), None);
        let result = session_identity(&session).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_empty_session_has_no_identity() {
        let store = Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);
        assert!(session_identity(&session).await.unwrap().is_none());
    }
}
