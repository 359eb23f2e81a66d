//! Signed-webhook verification and event mapping.
//!
//! Processor lifecycle events (renewal, payment failure, period end) are
//! delivered out of band. Each delivery carries a `Stripe-Signature`
//! header of the form `t=<unix>,v1=<hex hmac>`, where the signature is
//! HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::billing::SubscriptionStatus;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and future skew) of a signed timestamp.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Errors that can occur while verifying or parsing a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing or not in `t=..,v1=..` form.
    #[error("malformed signature header")]
    MalformedHeader,

    /// No candidate signature matched the payload.
    #[error("signature verification failed")]
    BadSignature,

    /// The signed timestamp is outside the accepted tolerance.
    #[error("signed timestamp outside tolerance: {age_secs}s")]
    StaleTimestamp {
        /// Seconds between the signed timestamp and now.
        age_secs: i64,
    },

    /// The payload is not the JSON shape this system expects.
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),
}

/// Verifies a webhook delivery against the endpoint secret.
///
/// `now` is the caller's clock as a unix timestamp, injected so tests
/// can pin it.
///
/// # Errors
///
/// Returns `WebhookError` if the header is malformed, the timestamp is
/// outside tolerance, or no `v1` candidate matches.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }

    let age_secs = (now - timestamp).abs();
    if age_secs > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp { age_secs });
    }

    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| WebhookError::BadSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice is constant-time
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(WebhookError::BadSignature)
}

/// A processor lifecycle event mapped onto the status-mirroring operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// A subscription's status changed; mirror it locally.
    StatusChanged {
        /// Processor subscription id.
        subscription_id: String,
        /// The new status to mirror.
        status: SubscriptionStatus,
    },
    /// An event type this system does not act on.
    Ignored,
}

/// Parses a verified event body and maps it to a mirroring action.
///
/// `customer.subscription.created/updated` mirror the carried status;
/// `customer.subscription.deleted` mirrors `canceled`;
/// `invoice.payment_failed` mirrors `past_due` for the invoice's
/// subscription. Everything else is ignored.
///
/// # Errors
///
/// Returns `WebhookError::MalformedPayload` if the body is not JSON or
/// an acted-on event lacks the fields it must carry.
pub fn parse_subscription_event(payload: &[u8]) -> Result<SubscriptionEvent, WebhookError> {
    let event: Value = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WebhookError::MalformedPayload("missing event type".to_string()))?;

    let object = event
        .pointer("/data/object")
        .ok_or_else(|| WebhookError::MalformedPayload("missing data.object".to_string()))?;

    match event_type {
        "customer.subscription.created" | "customer.subscription.updated" => {
            let subscription_id = required_str(object, "id")?;
            let status = required_str(object, "status")?;
            Ok(SubscriptionEvent::StatusChanged {
                subscription_id,
                status: SubscriptionStatus::parse(&status),
            })
        }
        "customer.subscription.deleted" => {
            let subscription_id = required_str(object, "id")?;
            Ok(SubscriptionEvent::StatusChanged {
                subscription_id,
                status: SubscriptionStatus::Canceled,
            })
        }
        "invoice.payment_failed" => {
            let subscription_id = required_str(object, "subscription")?;
            Ok(SubscriptionEvent::StatusChanged {
                subscription_id,
                status: SubscriptionStatus::PastDue,
            })
        }
        _ => Ok(SubscriptionEvent::Ignored),
    }
}

fn required_str(object: &Value, key: &str) -> Result<String, WebhookError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| WebhookError::MalformedPayload(format!("missing {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"customer.subscription.updated"}"#;
        let now = 1_760_000_000;
        let header = sign(payload, now - 10);

        assert!(verify_signature(payload, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = br#"{"type":"customer.subscription.updated"}"#;
        let now = 1_760_000_000;
        let header = sign(payload, now);

        let tampered = br#"{"type":"customer.subscription.deleted"}"#;
        assert!(matches!(
            verify_signature(tampered, &header, SECRET, now),
            Err(WebhookError::BadSignature)
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let now = 1_760_000_000;
        let header = sign(payload, now - SIGNATURE_TOLERANCE_SECS - 1);

        assert!(matches!(
            verify_signature(payload, &header, SECRET, now),
            Err(WebhookError::StaleTimestamp { .. })
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let now = 1_760_000_000;
        let header = sign(payload, now);

        assert!(verify_signature(payload, &header, "whsec_other", now).is_err());
    }

    #[test]
    fn test_missing_v1_rejected() {
        assert!(matches!(
            verify_signature(b"{}", "t=123", SECRET, 123),
            Err(WebhookError::MalformedHeader)
        ));
        assert!(matches!(
            verify_signature(b"{}", "nonsense", SECRET, 123),
            Err(WebhookError::MalformedHeader)
        ));
    }

    #[test]
    fn test_subscription_updated_maps_to_status_change() {
        let payload = br#"{
            "type": "customer.subscription.updated",
            "data": {"object": {"id": "sub_1", "status": "active"}}
        }"#;

        assert_eq!(
            parse_subscription_event(payload).unwrap(),
            SubscriptionEvent::StatusChanged {
                subscription_id: "sub_1".to_string(),
                status: SubscriptionStatus::Active,
            }
        );
    }

    #[test]
    fn test_subscription_deleted_maps_to_canceled() {
        let payload = br#"{
            "type": "customer.subscription.deleted",
            "data": {"object": {"id": "sub_1", "status": "canceled"}}
        }"#;

        assert_eq!(
            parse_subscription_event(payload).unwrap(),
            SubscriptionEvent::StatusChanged {
                subscription_id: "sub_1".to_string(),
                status: SubscriptionStatus::Canceled,
            }
        );
    }

    #[test]
    fn test_invoice_payment_failed_maps_to_past_due() {
        let payload = br#"{
            "type": "invoice.payment_failed",
            "data": {"object": {"id": "in_1", "subscription": "sub_9"}}
        }"#;

        assert_eq!(
            parse_subscription_event(payload).unwrap(),
            SubscriptionEvent::StatusChanged {
                subscription_id: "sub_9".to_string(),
                status: SubscriptionStatus::PastDue,
            }
        );
    }

    #[test]
    fn test_unrelated_event_ignored() {
        let payload = br#"{
            "type": "charge.refunded",
            "data": {"object": {"id": "ch_1"}}
        }"#;

        assert_eq!(
            parse_subscription_event(payload).unwrap(),
            SubscriptionEvent::Ignored
        );
    }
}
