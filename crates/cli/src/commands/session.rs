//! Development session issuing.
//!
//! Writes a `tower-sessions` record holding a [`CurrentIdentity`] straight
//! into the shared session table, standing in for the identity provider's
//! sign-in flow. The printed cookie works against both servers.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions_sqlx_store::PostgresStore;

use saakie_core::ExternalUserId;
use saakie_core::session::{CurrentIdentity, SESSION_COOKIE_NAME, keys};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid external id: {0}")]
    InvalidExternalId(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Store(#[from] tower_sessions::session_store::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Build the record for `external_id`, expiring `days` from now.
fn record(external_id: ExternalUserId, days: u16) -> Result<Record, SessionError> {
    let identity = serde_json::to_value(CurrentIdentity { external_id })?;
    let data: HashMap<String, Value> =
        HashMap::from([(keys::CURRENT_IDENTITY.to_string(), identity)]);

    Ok(Record {
        id: Id::default(),
        data,
        expiry_date: OffsetDateTime::now_utc() + Duration::days(i64::from(days)),
    })
}

/// Store a session for `external_id` and return the `Cookie` header value.
///
/// # Errors
///
/// Returns `SessionError` if the id is invalid or the store rejects the
/// record.
pub async fn issue(external_id: &str, days: u16) -> Result<String, SessionError> {
    let external_id = ExternalUserId::parse(external_id)
        .map_err(|e| SessionError::InvalidExternalId(e.to_string()))?;

    let database_url =
        super::database_url().ok_or(SessionError::MissingEnvVar("DATABASE_URL"))?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let store = PostgresStore::new(pool);

    let mut record = record(external_id, days)?;
    store.create(&mut record).await?;

    tracing::warn!(
        session_id = %record.id,
        "issued a development session; do not use in production"
    );
    Ok(format!("{SESSION_COOKIE_NAME}={}", record.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_holds_the_identity() {
        let record = record(ExternalUserId::parse("user_2abc").unwrap(), 2).unwrap();
        assert_eq!(
            record.data[keys::CURRENT_IDENTITY],
            serde_json::json!({"externalId": "user_2abc"})
        );
        assert!(record.expiry_date > OffsetDateTime::now_utc() + Duration::days(1));
    }
}
