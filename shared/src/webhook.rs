use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use lambda_http::http::HeaderMap;
use sha2::Sha256;

use crate::error::WebhookError;
use crate::types::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Allowed clock skew between the sender's timestamp and ours, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// The three signature headers sent with every delivery
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, WebhookError> {
        Ok(Self {
            id: required_header(headers, HEADER_ID)?,
            timestamp: required_header(headers, HEADER_TIMESTAMP)?,
            signature: required_header(headers, HEADER_SIGNATURE)?,
        })
    }
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

/// Verifies Svix-signed deliveries with a shared secret
#[derive(Clone)]
pub struct Webhook {
    key: Option<Vec<u8>>,
    tolerance_secs: i64,
}

impl Webhook {
    /// Accepts `whsec_<base64>` or bare base64. An empty or undecodable
    /// secret still builds, but every verification then fails.
    pub fn new(secret: &str) -> Self {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .filter(|key| !key.is_empty());

        if key.is_none() {
            tracing::warn!("Webhook signing secret is empty or invalid, deliveries will be rejected");
        }

        Self {
            key,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs.max(0);
        self
    }

    pub fn verify(
        &self,
        payload: &[u8],
        headers: &WebhookHeaders,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(payload, headers, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit clock (unix seconds)
    pub fn verify_at(
        &self,
        payload: &[u8],
        headers: &WebhookHeaders,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        let timestamp: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;

        if timestamp < now.saturating_sub(self.tolerance_secs) {
            return Err(WebhookError::TimestampTooOld);
        }
        if timestamp > now.saturating_add(self.tolerance_secs) {
            return Err(WebhookError::TimestampTooNew);
        }

        let mac = self.mac_for(&headers.id, timestamp, payload)?;

        // Header carries space-separated "v1,<base64>" entries; any match wins
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| general_purpose::STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if !matched {
            return Err(WebhookError::NoMatchingSignature);
        }

        Ok(serde_json::from_slice(payload)?)
    }

    /// Signature entry for a message, in the same format the sender uses
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let mac = self.mac_for(msg_id, timestamp, payload)?;
        let digest = general_purpose::STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("{},{}", SIGNATURE_VERSION, digest))
    }

    fn mac_for(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let key = self.key.as_deref().ok_or(WebhookError::InvalidSecret)?;
        let mut mac = HmacSha256::new_from_slice(key).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(format!("{}.{}.", msg_id, timestamp).as_bytes());
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64("test-signing-secret")
    const SECRET: &str = "whsec_dGVzdC1zaWduaW5nLXNlY3JldA==";
    const NOW: i64 = 1_700_000_000;
    const PAYLOAD: &[u8] = br#"{"type":"user.updated","data":{"id":"ext_1"}}"#;

    fn signed_headers(webhook: &Webhook, timestamp: i64, payload: &[u8]) -> WebhookHeaders {
        WebhookHeaders {
            id: "msg_1".to_string(),
            timestamp: timestamp.to_string(),
            signature: webhook.sign("msg_1", timestamp, payload).unwrap(),
        }
    }

    #[test]
    fn test_valid_signature() {
        let webhook = Webhook::new(SECRET);
        let headers = signed_headers(&webhook, NOW, PAYLOAD);

        let event = webhook.verify_at(PAYLOAD, &headers, NOW).unwrap();
        assert_eq!(event.event_type, "user.updated");
    }

    #[test]
    fn test_bare_secret_matches_prefixed() {
        let prefixed = Webhook::new(SECRET);
        let bare = Webhook::new("dGVzdC1zaWduaW5nLXNlY3JldA==");
        let headers = signed_headers(&prefixed, NOW, PAYLOAD);

        assert!(bare.verify_at(PAYLOAD, &headers, NOW).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let webhook = Webhook::new(SECRET);
        let headers = signed_headers(&webhook, NOW, PAYLOAD);
        let tampered = br#"{"type":"user.updated","data":{"id":"ext_2"}}"#;

        let err = webhook.verify_at(tampered, &headers, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::NoMatchingSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = Webhook::new("whsec_b3RoZXItc2VjcmV0");
        let headers = signed_headers(&signer, NOW, PAYLOAD);

        let err = Webhook::new(SECRET).verify_at(PAYLOAD, &headers, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::NoMatchingSignature));
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let signer = Webhook::new(SECRET);
        let headers = signed_headers(&signer, NOW, PAYLOAD);

        let err = Webhook::new("").verify_at(PAYLOAD, &headers, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSecret));
    }

    #[test]
    fn test_timestamp_window() {
        let webhook = Webhook::new(SECRET);

        let stale = signed_headers(&webhook, NOW - DEFAULT_TOLERANCE_SECS - 1, PAYLOAD);
        assert!(matches!(
            webhook.verify_at(PAYLOAD, &stale, NOW),
            Err(WebhookError::TimestampTooOld)
        ));

        let future = signed_headers(&webhook, NOW + DEFAULT_TOLERANCE_SECS + 1, PAYLOAD);
        assert!(matches!(
            webhook.verify_at(PAYLOAD, &future, NOW),
            Err(WebhookError::TimestampTooNew)
        ));

        let mut garbled = signed_headers(&webhook, NOW, PAYLOAD);
        garbled.timestamp = "yesterday".to_string();
        assert!(matches!(
            webhook.verify_at(PAYLOAD, &garbled, NOW),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    #[test]
    fn test_extreme_tolerance_does_not_overflow() {
        let webhook = Webhook::new(SECRET).with_tolerance(i64::MAX);
        let headers = signed_headers(&webhook, NOW, PAYLOAD);
        assert!(webhook.verify_at(PAYLOAD, &headers, NOW).is_ok());

        let mut far_past = signed_headers(&webhook, NOW, PAYLOAD);
        far_past.timestamp = i64::MIN.to_string();
        assert!(matches!(
            webhook.verify_at(PAYLOAD, &far_past, i64::MAX),
            Err(WebhookError::TimestampTooOld)
        ));
    }

    #[test]
    fn test_negative_tolerance_clamped_to_zero() {
        let webhook = Webhook::new(SECRET).with_tolerance(-5);
        let headers = signed_headers(&webhook, NOW, PAYLOAD);

        assert!(webhook.verify_at(PAYLOAD, &headers, NOW).is_ok());
    }

    #[test]
    fn test_any_listed_signature_may_match() {
        let webhook = Webhook::new(SECRET);
        let mut headers = signed_headers(&webhook, NOW, PAYLOAD);
        headers.signature = format!("v1,Zm9vYmFy v2,ignored {}", headers.signature);

        assert!(webhook.verify_at(PAYLOAD, &headers, NOW).is_ok());
    }

    #[test]
    fn test_signed_non_json_is_invalid_payload() {
        let webhook = Webhook::new(SECRET);
        let payload = b"not json";
        let headers = signed_headers(&webhook, NOW, payload);

        assert!(matches!(
            webhook.verify_at(payload, &headers, NOW),
            Err(WebhookError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_missing_header() {
        let mut map = HeaderMap::new();
        map.insert(HEADER_ID, "msg_1".parse().unwrap());
        map.insert(HEADER_TIMESTAMP, "1700000000".parse().unwrap());

        let err = WebhookHeaders::from_headers(&map).unwrap_err();
        assert!(matches!(err, WebhookError::MissingHeader(HEADER_SIGNATURE)));
    }
}
