//! Mirror identity lifecycle events into the directory.

use thiserror::Error;
use tracing::{info, instrument};

use saakie_core::ExternalUserId;

use super::event::{
    DeletedUser, PayloadError, ProviderUser, USER_CREATED, USER_DELETED, USER_UPDATED,
    VerifiedEvent,
};
use crate::db::{RepositoryError, UserStore};
use crate::models::UserAccount;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("User not found")]
    UnknownUser(ExternalUserId),

    #[error("{0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SyncError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => {
                Self::Conflict("Email already belongs to another account".to_owned())
            }
            other => Self::Repository(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Upserted { account: UserAccount, created: bool },
    Deleted(ExternalUserId),
    /// Event type the directory does not track.
    Ignored(String),
}

pub struct IdentitySync<'a> {
    store: &'a dyn UserStore,
}

impl<'a> IdentitySync<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn UserStore) -> Self {
        Self { store }
    }

    /// Apply one verified event.
    ///
    /// Upserts are keyed by external id, so redelivery of a create or update
    /// converges on the same row. Role and status are never touched by sync.
    ///
    /// # Errors
    ///
    /// - `SyncError::Payload` when the user object lacks an id or email
    /// - `SyncError::Conflict` when the email belongs to a different account
    /// - `SyncError::UnknownUser` when a deletion names no directory account
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn apply(&self, event: VerifiedEvent) -> Result<SyncOutcome, SyncError> {
        match event.event_type.as_str() {
            USER_CREATED | USER_UPDATED => {
                let profile = ProviderUser::from_value(event.data)?.into_profile()?;
                let (account, created) = self.store.upsert_identity(&profile).await?;
                info!(
                    user_id = %account.id,
                    external_id = %account.external_id,
                    created,
                    "identity synced"
                );
                Ok(SyncOutcome::Upserted { account, created })
            }
            USER_DELETED => {
                let external_id = DeletedUser::external_id(event.data)?;
                if !self.store.delete_by_external_id(&external_id).await? {
                    return Err(SyncError::UnknownUser(external_id));
                }
                info!(external_id = %external_id, "identity deleted");
                Ok(SyncOutcome::Deleted(external_id))
            }
            other => Ok(SyncOutcome::Ignored(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use saakie_core::{Email, OrderStatus, UserRole, UserStatus};

    use super::*;
    use crate::db::MemoryUserStore;
    use crate::models::{NewUser, UserChanges};

    fn event(event_type: &str, data: Value) -> VerifiedEvent {
        VerifiedEvent {
            event_type: event_type.to_owned(),
            data,
        }
    }

    fn provider_user(id: &str, email: &str, first: &str) -> Value {
        json!({
            "id": id,
            "email_addresses": [{ "id": "idn_1", "email_address": email }],
            "primary_email_address_id": "idn_1",
            "first_name": first,
            "last_name": "Sharma"
        })
    }

    #[tokio::test]
    async fn created_inserts_with_defaults() {
        let store = MemoryUserStore::new();
        let outcome = IdentitySync::new(&store)
            .apply(event(USER_CREATED, provider_user("user_1", "priya@saakie.in", "Priya")))
            .await
            .unwrap();

        let SyncOutcome::Upserted { account, created } = outcome else {
            panic!("expected upsert");
        };
        assert!(created);
        assert_eq!(account.name, "Priya Sharma");
        assert_eq!(account.role, UserRole::Customer);
        assert_eq!(account.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn redelivery_is_idempotent() {
        let store = MemoryUserStore::new();
        let sync = IdentitySync::new(&store);
        let payload = provider_user("user_1", "priya@saakie.in", "Priya");

        sync.apply(event(USER_CREATED, payload.clone())).await.unwrap();
        let second = sync.apply(event(USER_CREATED, payload)).await.unwrap();

        assert!(matches!(second, SyncOutcome::Upserted { created: false, .. }));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn update_refreshes_profile_but_keeps_role() {
        let store = MemoryUserStore::new();
        let sync = IdentitySync::new(&store);
        let SyncOutcome::Upserted { account, .. } = sync
            .apply(event(USER_CREATED, provider_user("user_1", "priya@saakie.in", "Priya")))
            .await
            .unwrap()
        else {
            panic!("expected upsert");
        };
        let promote = UserChanges {
            role: Some(UserRole::Manager),
            ..UserChanges::default()
        };
        store.update(account.id, &promote).await.unwrap();

        let outcome = sync
            .apply(event(USER_UPDATED, provider_user("user_1", "p.sharma@saakie.in", "P.")))
            .await
            .unwrap();
        let SyncOutcome::Upserted { account, created } = outcome else {
            panic!("expected upsert");
        };
        assert!(!created);
        assert_eq!(account.email.as_str(), "p.sharma@saakie.in");
        assert_eq!(account.name, "P. Sharma");
        assert_eq!(account.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn email_owned_by_another_account_conflicts() {
        let store = MemoryUserStore::new();
        store
            .insert(&NewUser {
                external_id: ExternalUserId::placeholder(),
                name: "Priya".to_owned(),
                email: Email::parse("priya@saakie.in").unwrap(),
                phone: None,
                role: UserRole::Customer,
                status: UserStatus::Active,
            })
            .await
            .unwrap();

        let err = IdentitySync::new(&store)
            .apply(event(USER_CREATED, provider_user("user_9", "priya@saakie.in", "Priya")))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn missing_email_is_a_payload_error() {
        let store = MemoryUserStore::new();
        let err = IdentitySync::new(&store)
            .apply(event(USER_CREATED, json!({ "id": "user_1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Payload(PayloadError::MissingEmail)));
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn deleted_cascades_and_unknown_is_an_error() {
        let store = MemoryUserStore::new();
        let sync = IdentitySync::new(&store);
        let SyncOutcome::Upserted { account, .. } = sync
            .apply(event(USER_CREATED, provider_user("user_1", "priya@saakie.in", "Priya")))
            .await
            .unwrap()
        else {
            panic!("expected upsert");
        };
        store.add_order(account.id, Decimal::from(1499), OrderStatus::Confirmed);

        let outcome = sync
            .apply(event(USER_DELETED, json!({ "id": "user_1", "deleted": true })))
            .await
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::Deleted(_)));
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.order_count(), 0);

        let again = sync
            .apply(event(USER_DELETED, json!({ "id": "user_1", "deleted": true })))
            .await
            .unwrap_err();
        assert!(matches!(again, SyncError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let store = MemoryUserStore::new();
        let outcome = IdentitySync::new(&store)
            .apply(event("session.created", json!({ "id": "sess_1" })))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored("session.created".to_owned()));
        assert_eq!(store.user_count(), 0);
    }
}
