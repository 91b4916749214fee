//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AdminConfig, ConfigError};
use crate::db::{PgUserStore, UserStore};
use crate::identity::WebhookVerifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Handlers reach storage through
/// the [`UserStore`] trait object, so tests can swap in an in-memory store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    users: Arc<dyn UserStore>,
    webhook_verifier: Option<Arc<dyn WebhookVerifier>>,
}

impl AppState {
    /// Create the production state: `PostgreSQL` user store and, when a
    /// signing secret is configured, a Svix webhook verifier.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the webhook secret cannot be turned into a
    /// verifier.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, ConfigError> {
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let webhook_verifier = config
            .identity
            .as_ref()
            .map(|identity| identity.verifier())
            .transpose()?
            .map(|verifier| Arc::new(verifier) as Arc<dyn WebhookVerifier>);

        Ok(Self::with_parts(config, pool, users, webhook_verifier))
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: AdminConfig,
        pool: PgPool,
        users: Arc<dyn UserStore>,
        webhook_verifier: Option<Arc<dyn WebhookVerifier>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                users,
                webhook_verifier,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Directory storage.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Webhook verifier, absent when no signing secret is configured.
    #[must_use]
    pub fn webhook_verifier(&self) -> Option<&dyn WebhookVerifier> {
        self.inner.webhook_verifier.as_deref()
    }
}
