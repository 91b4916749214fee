//! Webhook signature verification.
//!
//! The identity provider signs deliveries with the Svix scheme:
//! `HMAC-SHA256(key, "{id}.{timestamp}.{body}")`, base64 encoded and sent as
//! one or more space-separated `v1,<signature>` entries. The key is the
//! base64 part of a `whsec_` secret.

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument};

use super::event::VerifiedEvent;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the provider and us, in either direction.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

/// Prefix of provider signing secrets.
pub const SECRET_PREFIX: &str = "whsec_";

const SIGNATURE_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("timestamp outside tolerance")]
    Expired,

    #[error("no matching signature")]
    Mismatch,

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The three delivery headers, read from either the branded `svix-*` names
/// or the unbranded `webhook-*` ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    /// # Errors
    ///
    /// Returns `SignatureError::MissingHeader` naming the first absent header.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self, SignatureError> {
        Ok(Self {
            id: header(headers, "svix-id", "webhook-id")?,
            timestamp: header(headers, "svix-timestamp", "webhook-timestamp")?,
            signature: header(headers, "svix-signature", "webhook-signature")?,
        })
    }
}

fn header(
    headers: &HeaderMap,
    name: &'static str,
    fallback: &'static str,
) -> Result<String, SignatureError> {
    headers
        .get(name)
        .or_else(|| headers.get(fallback))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(SignatureError::MissingHeader(name))
}

/// Authenticates webhook deliveries and parses their envelope.
pub trait WebhookVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `SignatureError` if the delivery is not authentic, is outside
    /// the timestamp tolerance, or the body is not an event envelope.
    fn verify(&self, body: &[u8], headers: &WebhookHeaders)
    -> Result<VerifiedEvent, SignatureError>;
}

/// [`WebhookVerifier`] for Svix-signed deliveries.
pub struct SvixVerifier {
    key: SecretSlice<u8>,
}

impl std::fmt::Debug for SvixVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvixVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SvixVerifier {
    /// Build a verifier from a `whsec_<base64>` secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the prefix is missing or the
    /// remainder is not non-empty base64.
    pub fn from_secret(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret
            .trim()
            .strip_prefix(SECRET_PREFIX)
            .ok_or_else(|| SignatureError::InvalidSecret(format!("must start with {SECRET_PREFIX}")))?;
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret("empty key".to_owned()));
        }
        Ok(Self {
            key: SecretSlice::from(key),
        })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// The `v1,<base64>` signature the provider would send for this delivery.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the key is unusable.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(id, timestamp, body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION},{}", STANDARD.encode(digest)))
    }

    /// Verify against an explicit clock, in unix seconds.
    ///
    /// # Errors
    ///
    /// See [`WebhookVerifier::verify`].
    #[instrument(skip(self, body, headers), fields(webhook_id = %headers.id))]
    pub fn verify_at(
        &self,
        body: &[u8],
        headers: &WebhookHeaders,
        now: i64,
    ) -> Result<VerifiedEvent, SignatureError> {
        let timestamp: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE_SECS.unsigned_abs() {
            return Err(SignatureError::Expired);
        }

        let mac = self.mac(&headers.id, &headers.timestamp, body)?;
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
            .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        debug!("webhook signature verified");
        Ok(serde_json::from_slice(body)?)
    }
}

impl WebhookVerifier for SvixVerifier {
    fn verify(
        &self,
        body: &[u8],
        headers: &WebhookHeaders,
    ) -> Result<VerifiedEvent, SignatureError> {
        self.verify_at(body, headers, chrono::Utc::now().timestamp())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const BODY: &[u8] = br#"{"type":"user.created","data":{"id":"user_2abc"}}"#;
    const NOW: i64 = 1_760_000_000;

    fn secret(key: &[u8]) -> String {
        format!("{SECRET_PREFIX}{}", STANDARD.encode(key))
    }

    fn verifier() -> SvixVerifier {
        SvixVerifier::from_secret(&secret(b"saakie-identity-signing-key")).unwrap()
    }

    fn signed(verifier: &SvixVerifier, timestamp: i64, body: &[u8]) -> WebhookHeaders {
        let timestamp = timestamp.to_string();
        WebhookHeaders {
            id: "msg_2xyz".to_owned(),
            signature: verifier.sign("msg_2xyz", &timestamp, body).unwrap(),
            timestamp,
        }
    }

    #[test]
    fn valid_signature_verifies_and_parses() {
        let verifier = verifier();
        let headers = signed(&verifier, NOW, BODY);
        let event = verifier.verify_at(BODY, &headers, NOW).unwrap();
        assert_eq!(event.event_type, "user.created");
        assert_eq!(event.data["id"], "user_2abc");
    }

    #[test]
    fn any_listed_signature_may_match() {
        let verifier = verifier();
        let mut headers = signed(&verifier, NOW, BODY);
        headers.signature = format!("v1,bm90LXRoaXMtb25l {}", headers.signature);
        assert!(verifier.verify_at(BODY, &headers, NOW).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let verifier = verifier();
        let headers = signed(&verifier, NOW, BODY);
        let tampered = br#"{"type":"user.deleted","data":{"id":"user_2abc"}}"#;
        assert!(matches!(
            verifier.verify_at(tampered, &headers, NOW),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let other = SvixVerifier::from_secret(&secret(b"someone-else")).unwrap();
        let headers = signed(&other, NOW, BODY);
        assert!(matches!(
            verifier().verify_at(BODY, &headers, NOW),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn stale_and_future_timestamps_are_rejected() {
        let verifier = verifier();
        for skew in [-(TIMESTAMP_TOLERANCE_SECS + 1), TIMESTAMP_TOLERANCE_SECS + 1] {
            let headers = signed(&verifier, NOW + skew, BODY);
            assert!(matches!(
                verifier.verify_at(BODY, &headers, NOW),
                Err(SignatureError::Expired)
            ));
        }
        let edge = signed(&verifier, NOW - TIMESTAMP_TOLERANCE_SECS, BODY);
        assert!(verifier.verify_at(BODY, &edge, NOW).is_ok());
    }

    #[test]
    fn extreme_timestamps_are_expired_not_overflowed() {
        let verifier = verifier();
        for extreme in [i64::MIN, i64::MAX] {
            let mut headers = signed(&verifier, NOW, BODY);
            headers.timestamp = extreme.to_string();
            assert!(matches!(
                verifier.verify_at(BODY, &headers, NOW),
                Err(SignatureError::Expired)
            ));
        }
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let verifier = verifier();
        let mut headers = signed(&verifier, NOW, BODY);
        headers.timestamp = "yesterday".to_owned();
        assert!(matches!(
            verifier.verify_at(BODY, &headers, NOW),
            Err(SignatureError::InvalidTimestamp)
        ));
    }

    #[test]
    fn unknown_signature_versions_are_ignored() {
        let verifier = verifier();
        let mut headers = signed(&verifier, NOW, BODY);
        headers.signature = headers.signature.replacen("v1,", "v2,", 1);
        assert!(verifier.verify_at(BODY, &headers, NOW).is_err());
    }

    #[test]
    fn authentic_non_json_body_is_a_payload_error() {
        let verifier = verifier();
        let headers = signed(&verifier, NOW, b"not json");
        assert!(matches!(
            verifier.verify_at(b"not json", &headers, NOW),
            Err(SignatureError::Payload(_))
        ));
    }

    #[test]
    fn secret_must_be_prefixed_base64() {
        assert!(SvixVerifier::from_secret("c2VjcmV0").is_err());
        assert!(SvixVerifier::from_secret("whsec_***").is_err());
        assert!(SvixVerifier::from_secret("whsec_").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", verifier());
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn headers_fall_back_to_unbranded_names() {
        let mut map = HeaderMap::new();
        map.insert("webhook-id", HeaderValue::from_static("msg_1"));
        map.insert("svix-timestamp", HeaderValue::from_static("1760000000"));
        map.insert("webhook-signature", HeaderValue::from_static("v1,abc="));
        let headers = WebhookHeaders::from_header_map(&map).unwrap();
        assert_eq!(headers.id, "msg_1");
        assert_eq!(headers.timestamp, "1760000000");

        map.remove("svix-timestamp");
        assert!(matches!(
            WebhookHeaders::from_header_map(&map),
            Err(SignatureError::MissingHeader("svix-timestamp"))
        ));
    }
}
