//! Webhook delivery verification and parsing.
//!
//! Deliveries carry a `Stripe-Signature` header of the form
//! `t=<unix-seconds>,v1=<hex-hmac>[,v1=…]`; the signed message is
//! `"{t}.{raw payload}"` under HMAC-SHA256 with the endpoint secret.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How far a delivery's timestamp may drift from the current time.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("malformed signature header")]
    BadHeader,
    #[error("no signature matched the payload")]
    SignatureMismatch,
    #[error("timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("unparseable event payload: {0}")]
    BadPayload(String),
}

/// Verify a delivery against the endpoint secret. `now` is the current
/// unix time in seconds, passed in so callers (and tests) control the
/// clock.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), WebhookError> {
    let (timestamp, signatures) = parse_header(header)?;

    if (now - timestamp).unsigned_abs() > tolerance.as_secs() {
        return Err(WebhookError::TimestampOutOfTolerance);
    }

    let mut signed = Vec::with_capacity(payload.len() + 16);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(payload);

    for signature in &signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::BadHeader)?;
        mac.update(&signed);
        // verify_slice is constant-time
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(WebhookError::SignatureMismatch)
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(t), false) => Ok((t, signatures)),
        _ => Err(WebhookError::BadHeader),
    }
}

/// Produce a valid `Stripe-Signature` header for a payload. Used by test
/// clients to exercise the webhook endpoint.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut signed = Vec::with_capacity(payload.len() + 16);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(&signed);
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={timestamp},v1={signature}")
}

// --- Event payloads ---

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// A metadata value on the event's object, if present.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.data.object.get("metadata")?.get(key)?.as_str()
    }

    /// The event object's id, if present.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id")?.as_str()
    }
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    serde_json::from_slice(payload).map_err(|e| WebhookError::BadPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &[u8] = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_123","metadata":{"product_id":"gift_card_25"}}}}"#;

    #[test]
    fn valid_signature_accepted() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000);
        let result = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, 1_700_000_010);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn wrong_secret_rejected() {
        let header = sign_payload(PAYLOAD, "whsec_other", 1_700_000_000);
        let result = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, 1_700_000_000);
        assert_eq!(result, Err(WebhookError::SignatureMismatch));
    }

    #[test]
    fn tampered_payload_rejected() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000);
        let result = verify_signature(
            br#"{"type":"checkout.session.completed","amount":0}"#,
            &header,
            SECRET,
            DEFAULT_TOLERANCE,
            1_700_000_000,
        );
        assert_eq!(result, Err(WebhookError::SignatureMismatch));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000);
        let result = verify_signature(
            PAYLOAD,
            &header,
            SECRET,
            DEFAULT_TOLERANCE,
            1_700_000_000 + 301,
        );
        assert_eq!(result, Err(WebhookError::TimestampOutOfTolerance));
    }

    #[test]
    fn future_timestamp_rejected() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000);
        let result = verify_signature(
            PAYLOAD,
            &header,
            SECRET,
            DEFAULT_TOLERANCE,
            1_700_000_000 - 301,
        );
        assert_eq!(result, Err(WebhookError::TimestampOutOfTolerance));
    }

    #[test]
    fn malformed_headers_rejected() {
        for header in ["", "t=abc,v1=00", "v1=00", "t=123", "garbage"] {
            let result = verify_signature(PAYLOAD, header, SECRET, DEFAULT_TOLERANCE, 123);
            assert_eq!(result, Err(WebhookError::BadHeader), "header: {header:?}");
        }
    }

    #[test]
    fn second_v1_signature_accepted() {
        // During secret rotation two v1 entries are sent; either may match.
        let valid = sign_payload(PAYLOAD, SECRET, 1_700_000_000);
        let signature = valid.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1=deadbeef,v1={signature}");
        let result = verify_signature(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, 1_700_000_000);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn event_parsing() {
        let event = parse_event(PAYLOAD).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.object_id(), Some("cs_123"));
        assert_eq!(event.metadata("product_id"), Some("gift_card_25"));
        assert_eq!(event.metadata("missing"), None);
    }

    #[test]
    fn unparseable_event_rejected() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(WebhookError::BadPayload(_))
        ));
    }
}
