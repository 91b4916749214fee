//! User directory operations.
//!
//! Expected conditions (missing fields, unknown ids, duplicate emails, the
//! self-delete guard) are detected before storage is mutated and returned as
//! typed [`DirectoryError`]s. The email pre-checks are a fast path only:
//! the store's unique constraint is what actually guarantees uniqueness, and
//! a racing insert surfaces as [`DirectoryError::Conflict`] too.

mod error;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use saakie_core::{Email, ExternalUserId, UserId, UserRole, UserStatus};

use crate::db::{RepositoryError, UserStore};
use crate::models::{
    NewUser, PageRequest, UserAccount, UserChanges, UserDetail, UserFilter, UserSummary,
};

pub use error::DirectoryError;

/// Query string for the list endpoint. Everything arrives as text so that
/// malformed values become validation errors rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Partial update body. An absent key leaves the field alone; for `phone`,
/// an explicit `null` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Distinguish `"phone": null` (`Some(None)`) from a missing key (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserSummary>,
    pub pagination: Pagination,
}

/// Body returned by create and update.
#[derive(Debug, Serialize)]
pub struct UserMutation {
    pub message: &'static str,
    pub user: UserSummary,
}

fn parse_number(field: &str, value: Option<&str>) -> Result<Option<u32>, DirectoryError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| DirectoryError::Validation(format!("Invalid {field}: {v}")))
        })
        .transpose()
}

/// `"all"`, blank, or absent mean no filter.
fn parse_enum_filter<T>(value: Option<&str>) -> Result<Option<T>, DirectoryError>
where
    T: core::str::FromStr<Err = saakie_core::ParseEnumError>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e: saakie_core::ParseEnumError| DirectoryError::Validation(e.to_string())),
    }
}

fn parse_enum<T>(value: Option<&str>) -> Result<Option<T>, DirectoryError>
where
    T: core::str::FromStr<Err = saakie_core::ParseEnumError>,
{
    value
        .map(|v| {
            v.parse()
                .map_err(|e: saakie_core::ParseEnumError| DirectoryError::Validation(e.to_string()))
        })
        .transpose()
}

fn parse_email(value: &str) -> Result<Email, DirectoryError> {
    Email::parse(value).map_err(|e| DirectoryError::Validation(format!("Invalid email: {e}")))
}

/// Blank phone numbers are stored as no phone number.
fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_owned())
        .filter(|p| !p.is_empty())
}

/// Directory operations over a [`UserStore`].
pub struct UserDirectory<'a> {
    store: &'a dyn UserStore,
}

impl<'a> UserDirectory<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn UserStore) -> Self {
        Self { store }
    }

    /// List accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` for unparseable paging values or
    /// unknown role/status names, `DirectoryError::Repository` on storage
    /// failure.
    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListUsersParams) -> Result<ListUsersResponse, DirectoryError> {
        let page = PageRequest::new(
            parse_number("page", params.page.as_deref())?,
            parse_number("limit", params.limit.as_deref())?,
        );
        let filter = UserFilter {
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            role: parse_enum_filter::<UserRole>(params.role.as_deref())?,
            status: parse_enum_filter::<UserStatus>(params.status.as_deref())?,
        };

        let result = self.store.list(&filter, page).await?;
        Ok(ListUsersResponse {
            users: result.users,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: result.total,
                total_pages: page.total_pages(result.total),
            },
        })
    }

    /// One account with orders, addresses, and aggregates.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no such account exists.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<UserDetail, DirectoryError> {
        self.store
            .get_detail(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    /// Create a directory-only account.
    ///
    /// The account gets a placeholder external id: it is not provisioned
    /// with the identity provider and cannot sign in until it is.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` if name or email is missing or
    /// malformed, `DirectoryError::Conflict` if the email is taken.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<UserMutation, DirectoryError> {
        let name = request.name.as_deref().map(str::trim).unwrap_or_default();
        let email = request.email.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() || email.is_empty() {
            return Err(DirectoryError::Validation(
                "Name and email are required".to_owned(),
            ));
        }
        let email = parse_email(email)?;
        let role = parse_enum::<UserRole>(request.role.as_deref())?.unwrap_or_default();
        let status = parse_enum::<UserStatus>(request.status.as_deref())?.unwrap_or_default();

        if self.store.get_by_email(&email).await?.is_some() {
            return Err(DirectoryError::Conflict(
                "User with this email already exists".to_owned(),
            ));
        }

        let new_user = NewUser {
            external_id: ExternalUserId::placeholder(),
            name: name.to_owned(),
            email,
            phone: normalize_phone(request.phone),
            role,
            status,
        };
        let account = self.store.insert(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                DirectoryError::Conflict("User with this email already exists".to_owned())
            }
            other => other.into(),
        })?;

        tracing::info!(user_id = %account.id, "directory account created");
        Ok(UserMutation {
            message: "User created successfully",
            user: UserSummary {
                account,
                aggregates: crate::models::OrderAggregates::default(),
            },
        })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` for an unknown id,
    /// `DirectoryError::Conflict` if the new email belongs to another
    /// account, `DirectoryError::Validation` for blank or malformed fields.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: UserId,
        request: UpdateUserRequest,
    ) -> Result<UserMutation, DirectoryError> {
        let current = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        let name = match request.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(DirectoryError::Validation("Name cannot be empty".to_owned()));
            }
            other => other.map(str::to_owned),
        };
        let email = request.email.as_deref().map(parse_email).transpose()?;
        let changes = UserChanges {
            name,
            email,
            phone: request.phone.map(normalize_phone),
            role: parse_enum::<UserRole>(request.role.as_deref())?,
            status: parse_enum::<UserStatus>(request.status.as_deref())?,
        };

        if let Some(email) = &changes.email
            && email != &current.email
            && let Some(owner) = self.store.get_by_email(email).await?
            && owner.id != id
        {
            return Err(DirectoryError::Conflict("Email already taken".to_owned()));
        }

        let account = self
            .store
            .update(id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    DirectoryError::Conflict("Email already taken".to_owned())
                }
                other => other.into(),
            })?
            .ok_or(DirectoryError::NotFound)?;
        let aggregates = self.store.aggregates(id).await?;

        tracing::info!(user_id = %id, "directory account updated");
        Ok(UserMutation {
            message: "User updated successfully",
            user: UserSummary {
                account,
                aggregates,
            },
        })
    }

    /// Delete an account and, by cascade, its addresses and orders.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` for an unknown id and
    /// `DirectoryError::SelfDelete` when `actor` targets their own account.
    #[instrument(skip(self, actor), fields(actor = %actor.external_id))]
    pub async fn delete(&self, id: UserId, actor: &UserAccount) -> Result<(), DirectoryError> {
        let target = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        if target.external_id == actor.external_id {
            return Err(DirectoryError::SelfDelete);
        }

        if !self.store.delete(id).await? {
            return Err(DirectoryError::NotFound);
        }

        tracing::info!(user_id = %id, "directory account deleted");
        Ok(())
    }
}
