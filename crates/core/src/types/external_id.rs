//! Identifier assigned to a person by the external identity provider.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`ExternalUserId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalUserIdError {
    #[error("external user id cannot be empty")]
    Empty,
    #[error("external user id must be at most {max} characters")]
    TooLong { max: usize },
    #[error("external user id cannot contain whitespace")]
    Whitespace,
}

/// The identity provider's stable id for a user (e.g. `user_2abc...`).
///
/// Accounts created from the admin directory carry a placeholder built with
/// [`ExternalUserId::placeholder`] until they are provisioned upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalUserId(String);

impl ExternalUserId {
    pub const MAX_LENGTH: usize = 255;

    /// Prefix of ids that were never issued by the identity provider.
    pub const PLACEHOLDER_PREFIX: &'static str = "pending_";

    /// Parse an id received from the provider or a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, too long, or contains whitespace.
    pub fn parse(s: &str) -> Result<Self, ExternalUserIdError> {
        if s.is_empty() {
            return Err(ExternalUserIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ExternalUserIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ExternalUserIdError::Whitespace);
        }
        Ok(Self(s.to_owned()))
    }

    /// A fresh, unique id for a directory-only account.
    #[must_use]
    pub fn placeholder() -> Self {
        Self(format!(
            "{}{}",
            Self::PLACEHOLDER_PREFIX,
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Whether this id was minted locally rather than by the provider.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(Self::PLACEHOLDER_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ExternalUserId {
    type Error = ExternalUserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExternalUserId> for String {
    fn from(id: ExternalUserId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ExternalUserId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ExternalUserId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <String as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ExternalUserId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
