//! Session contents shared by the storefront and admin servers.
//!
//! Both servers use the same session store and cookie. The identity
//! provider's sign-in integration (or `saakie-cli session issue` in
//! development) writes [`CurrentIdentity`] under [`keys::CURRENT_IDENTITY`].
//! Role and status are never cached here; consumers re-read the directory.

use serde::{Deserialize, Serialize};

use crate::ExternalUserId;

/// Who the identity provider says the caller is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentIdentity {
    pub external_id: ExternalUserId,
}

/// Session keys.
pub mod keys {
    /// Holds a [`super::CurrentIdentity`].
    pub const CURRENT_IDENTITY: &str = "current_identity";

    /// Holds the shopper's persisted cart.
    pub const CART: &str = crate::cart::CART_SLOT;
}

/// Name of the session cookie both servers read.
pub const SESSION_COOKIE_NAME: &str = "saakie_session";

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identity_uses_camel_case_keys() {
        let identity = CurrentIdentity {
            external_id: ExternalUserId::parse("user_123").unwrap(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["externalId"], "user_123");
    }
}
