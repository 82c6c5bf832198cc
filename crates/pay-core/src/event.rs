//! # Webhook Event Types
//!
//! Verified processor callbacks, modelled as a closed set of known event
//! types plus an explicit `Unknown` variant that keeps the raw payload.

use crate::error::{PaymentError, PaymentResult};
use crate::session::{ORDER_REFERENCE_METADATA_KEY, RETURN_URL_METADATA_KEY};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Event type tag for a captured payment
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Event type tag for a failed payment attempt
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Event types this backend acts on; everything else is acknowledged and ignored
pub const HANDLED_WEBHOOK_EVENTS: &[&str] = &[PAYMENT_SUCCEEDED, PAYMENT_FAILED];

/// A verified (or, in unverified mode, trusted) webhook callback
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Processor event ID (evt_...), usable for downstream deduplication
    pub event_id: Option<String>,

    /// When the processor created the event
    pub created: Option<DateTime<Utc>>,

    /// Whether the event came from live mode
    pub livemode: bool,

    /// The typed event body
    pub kind: WebhookEventKind,
}

/// Event body, tagged by event type
#[derive(Debug, Clone)]
pub enum WebhookEventKind {
    PaymentSucceeded(PaymentIntentEvent),
    PaymentFailed(PaymentIntentEvent),
    Unknown {
        event_type: String,
        data: serde_json::Value,
    },
}

impl WebhookEvent {
    /// Build an event from its type tag and the `data` member of the envelope.
    ///
    /// Known types must carry a payment intent under `data.object`.
    pub fn from_parts(
        event_id: Option<String>,
        created: Option<DateTime<Utc>>,
        livemode: bool,
        event_type: &str,
        data: serde_json::Value,
    ) -> PaymentResult<Self> {
        let kind = match event_type {
            PAYMENT_SUCCEEDED => WebhookEventKind::PaymentSucceeded(PaymentIntentEvent::from_data(&data)?),
            PAYMENT_FAILED => WebhookEventKind::PaymentFailed(PaymentIntentEvent::from_data(&data)?),
            other => WebhookEventKind::Unknown {
                event_type: other.to_string(),
                data,
            },
        };

        Ok(Self {
            event_id,
            created,
            livemode,
            kind,
        })
    }

    /// The processor's type tag for this event
    pub fn event_type(&self) -> &str {
        match &self.kind {
            WebhookEventKind::PaymentSucceeded(_) => PAYMENT_SUCCEEDED,
            WebhookEventKind::PaymentFailed(_) => PAYMENT_FAILED,
            WebhookEventKind::Unknown { event_type, .. } => event_type.as_str(),
        }
    }

    /// Check if the event type is one this backend acts on
    pub fn is_handled(&self) -> bool {
        !matches!(self.kind, WebhookEventKind::Unknown { .. })
    }
}

/// Payment intent snapshot carried by `payment_intent.*` events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentIntentEvent {
    pub id: String,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

/// Decline details attached to a failed intent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub decline_code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentIntentEvent {
    /// Parse from the `data` member of an event envelope
    pub fn from_data(data: &serde_json::Value) -> PaymentResult<Self> {
        let object = data.get("object").ok_or_else(|| {
            PaymentError::WebhookParseError("Missing data.object".to_string())
        })?;

        serde_json::from_value(object.clone()).map_err(|e| {
            PaymentError::WebhookParseError(format!("Invalid payment intent object: {}", e))
        })
    }

    /// Return URL recorded when the session was created
    pub fn return_url(&self) -> Option<&str> {
        self.metadata.get(RETURN_URL_METADATA_KEY).map(|s| s.as_str())
    }

    /// Local order reference recorded when the session was created
    pub fn order_reference(&self) -> Option<&str> {
        self.metadata
            .get(ORDER_REFERENCE_METADATA_KEY)
            .map(|s| s.as_str())
    }

    /// Human-readable failure reason, if the processor gave one
    pub fn failure_message(&self) -> Option<&str> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intent_data() -> serde_json::Value {
        json!({
            "object": {
                "id": "pi_test_123",
                "object": "payment_intent",
                "amount": 1400,
                "currency": "usd",
                "status": "succeeded",
                "metadata": {
                    "return_url": "https://x/thank-you",
                    "order_reference": "ord-1"
                }
            }
        })
    }

    #[test]
    fn test_known_event_parses_intent() {
        let event = WebhookEvent::from_parts(
            Some("evt_1".into()),
            None,
            false,
            PAYMENT_SUCCEEDED,
            intent_data(),
        )
        .unwrap();

        assert!(event.is_handled());
        assert_eq!(event.event_type(), PAYMENT_SUCCEEDED);
        match event.kind {
            WebhookEventKind::PaymentSucceeded(intent) => {
                assert_eq!(intent.id, "pi_test_123");
                assert_eq!(intent.amount, Some(1400));
                assert_eq!(intent.return_url(), Some("https://x/thank-you"));
                assert_eq!(intent.order_reference(), Some("ord-1"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_failed_event_exposes_reason() {
        let data = json!({
            "object": {
                "id": "pi_test_456",
                "status": "requires_payment_method",
                "last_payment_error": {
                    "code": "card_declined",
                    "decline_code": "insufficient_funds",
                    "message": "Your card has insufficient funds."
                }
            }
        });

        let event = WebhookEvent::from_parts(None, None, false, PAYMENT_FAILED, data).unwrap();
        match event.kind {
            WebhookEventKind::PaymentFailed(intent) => {
                assert_eq!(intent.failure_message(), Some("Your card has insufficient funds."));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_keeps_payload() {
        let data = json!({ "object": { "id": "ch_1" } });
        let event =
            WebhookEvent::from_parts(None, None, false, "charge.refunded", data.clone()).unwrap();

        assert!(!event.is_handled());
        assert_eq!(event.event_type(), "charge.refunded");
        match event.kind {
            WebhookEventKind::Unknown { data: kept, .. } => assert_eq!(kept, data),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_known_event_without_object_is_parse_error() {
        let result = WebhookEvent::from_parts(None, None, false, PAYMENT_SUCCEEDED, json!({}));
        assert!(matches!(result, Err(PaymentError::WebhookParseError(_))));
    }
}
