//! Identity provider event payloads.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use saakie_core::{Email, EmailError, ExternalUserId, ExternalUserIdError};

use crate::models::IdentityProfile;

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const USER_DELETED: &str = "user.deleted";

/// Name stored when the provider has neither a first nor a last name.
pub const FALLBACK_NAME: &str = "User";

/// An authenticated delivery envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifiedEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Missing user id")]
    MissingId,

    #[error("Missing email address")]
    MissingEmail,

    #[error("Invalid user id: {0}")]
    InvalidId(#[from] ExternalUserIdError),

    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Malformed user payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct EmailAddress {
    id: Option<String>,
    email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PhoneNumber {
    id: Option<String>,
    phone_number: Option<String>,
}

/// The provider's user object, as sent in `user.created` / `user.updated`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderUser {
    id: Option<String>,
    email_addresses: Option<Vec<EmailAddress>>,
    primary_email_address_id: Option<String>,
    phone_numbers: Option<Vec<PhoneNumber>>,
    primary_phone_number_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// The entry whose id is the primary id, else the first entry.
fn primary<'a, T>(
    entries: &'a [T],
    primary_id: Option<&str>,
    id: impl Fn(&T) -> Option<&str>,
) -> Option<&'a T> {
    primary_id
        .and_then(|wanted| entries.iter().find(|e| id(e) == Some(wanted)))
        .or_else(|| entries.first())
}

fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    let joined = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

impl ProviderUser {
    /// # Errors
    ///
    /// Returns `PayloadError::Malformed` if `data` is not a user object.
    pub fn from_value(data: Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(data)?)
    }

    /// Reduce to the fields the directory mirrors.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::MissingId` or `PayloadError::MissingEmail` when
    /// the object has no usable id or email address.
    pub fn into_profile(self) -> Result<IdentityProfile, PayloadError> {
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(PayloadError::MissingId)?;
        let external_id = ExternalUserId::parse(id)?;

        let emails = self.email_addresses.unwrap_or_default();
        let email = primary(&emails, self.primary_email_address_id.as_deref(), |e| {
            e.id.as_deref()
        })
        .and_then(|e| e.email_address.as_deref())
        .filter(|e| !e.trim().is_empty())
        .ok_or(PayloadError::MissingEmail)?;
        let email = Email::parse(email)?;

        let phones = self.phone_numbers.unwrap_or_default();
        let phone = primary(&phones, self.primary_phone_number_id.as_deref(), |p| {
            p.id.as_deref()
        })
        .and_then(|p| p.phone_number.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned);

        Ok(IdentityProfile {
            external_id,
            email,
            name: display_name(self.first_name.as_deref(), self.last_name.as_deref()),
            phone,
        })
    }
}

/// Payload of `user.deleted`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedUser {
    id: Option<String>,
}

impl DeletedUser {
    /// # Errors
    ///
    /// Returns `PayloadError` if the object carries no usable id.
    pub fn external_id(data: Value) -> Result<ExternalUserId, PayloadError> {
        let deleted: Self = serde_json::from_value(data)?;
        let id = deleted
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(PayloadError::MissingId)?;
        Ok(ExternalUserId::parse(&id)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(data: Value) -> Result<IdentityProfile, PayloadError> {
        ProviderUser::from_value(data)?.into_profile()
    }

    #[test]
    fn picks_primary_email_and_phone() {
        let profile = user(json!({
            "id": "user_2abc",
            "email_addresses": [
                { "id": "idn_1", "email_address": "old@saakie.in" },
                { "id": "idn_2", "email_address": "priya@saakie.in" }
            ],
            "primary_email_address_id": "idn_2",
            "phone_numbers": [
                { "id": "phn_1", "phone_number": "+919845000001" },
                { "id": "phn_2", "phone_number": "+919845000002" }
            ],
            "primary_phone_number_id": "phn_2",
            "first_name": "Priya",
            "last_name": "Sharma"
        }))
        .unwrap();

        assert_eq!(profile.external_id.as_str(), "user_2abc");
        assert_eq!(profile.email.as_str(), "priya@saakie.in");
        assert_eq!(profile.phone.as_deref(), Some("+919845000002"));
        assert_eq!(profile.name, "Priya Sharma");
    }

    #[test]
    fn falls_back_to_first_entries() {
        let profile = user(json!({
            "id": "user_2abc",
            "email_addresses": [{ "id": "idn_1", "email_address": "first@saakie.in" }],
            "primary_email_address_id": "idn_missing",
            "phone_numbers": [{ "id": "phn_1", "phone_number": "+919845000001" }]
        }))
        .unwrap();
        assert_eq!(profile.email.as_str(), "first@saakie.in");
        assert_eq!(profile.phone.as_deref(), Some("+919845000001"));
    }

    #[test]
    fn blank_names_fall_back() {
        let profile = user(json!({
            "id": "user_2abc",
            "email_addresses": [{ "id": "e", "email_address": "a@saakie.in" }],
            "first_name": "  ",
            "last_name": null
        }))
        .unwrap();
        assert_eq!(profile.name, FALLBACK_NAME);
        assert_eq!(profile.phone, None);

        assert_eq!(display_name(Some("Meera"), None), "Meera");
        assert_eq!(display_name(None, Some("Iyer")), "Iyer");
    }

    #[test]
    fn id_and_email_are_required() {
        let no_id = user(json!({
            "email_addresses": [{ "id": "e", "email_address": "a@saakie.in" }]
        }));
        assert!(matches!(no_id, Err(PayloadError::MissingId)));

        let no_email = user(json!({ "id": "user_2abc", "email_addresses": [] }));
        assert!(matches!(no_email, Err(PayloadError::MissingEmail)));

        let null_email = user(json!({ "id": "user_2abc", "email_addresses": null }));
        assert!(matches!(null_email, Err(PayloadError::MissingEmail)));
    }

    #[test]
    fn deleted_payload_needs_id() {
        let id = DeletedUser::external_id(json!({ "id": "user_2abc", "deleted": true })).unwrap();
        assert_eq!(id.as_str(), "user_2abc");
        assert!(DeletedUser::external_id(json!({ "deleted": true })).is_err());
    }

    #[test]
    fn envelope_data_defaults_to_null() {
        let event: VerifiedEvent = serde_json::from_str(r#"{"type":"session.created"}"#).unwrap();
        assert_eq!(event.event_type, "session.created");
        assert!(event.data.is_null());
    }
}
