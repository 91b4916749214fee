//! Directory account commands.
//!
//! Accounts are created by the identity webhook with the `CUSTOMER` role, so
//! the first administrator has to be promoted from here.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use saakie_core::{Email, ParseEnumError, UserRole};

#[derive(Debug, Error)]
pub enum UsersError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}. Valid roles: CUSTOMER, MANAGER, ADMIN")]
    InvalidRole(#[from] ParseEnumError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account with email: {0}")]
    NotFound(Email),
}

/// Parse the command-line arguments before touching the database.
fn parse_args(email: &str, role: &str) -> Result<(Email, UserRole), UsersError> {
    let email = Email::parse(email).map_err(|e| UsersError::InvalidEmail(e.to_string()))?;
    let role = role.parse::<UserRole>()?;
    Ok((email, role))
}

/// Set the role of the account registered under `email`.
///
/// # Errors
///
/// Returns `UsersError` for invalid arguments, a missing account, or a
/// database failure.
pub async fn set_role(email: &str, role: &str) -> Result<(), UsersError> {
    let (email, role) = parse_args(email, role)?;

    let database_url = super::database_url().ok_or(UsersError::MissingEnvVar("DATABASE_URL"))?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE email = $2 RETURNING id",
    )
    .bind(role)
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

    let id = updated.ok_or_else(|| UsersError::NotFound(email.clone()))?;
    tracing::info!(user_id = id, %email, %role, "role updated");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        let (email, role) = parse_args(" owner@saakie.in ", "admin").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert_eq!(email.as_str(), "owner@saakie.in");
    }

    #[test]
    fn rejects_unknown_roles_and_bad_emails() {
        let err = parse_args("owner@saakie.in", "SUPER_ADMIN").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid role: SUPER_ADMIN. Valid roles: CUSTOMER, MANAGER, ADMIN"
        );
        assert!(matches!(
            parse_args("owner", "ADMIN"),
            Err(UsersError::InvalidEmail(_))
        ));
    }
}
