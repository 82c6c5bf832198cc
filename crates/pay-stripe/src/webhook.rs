//! # Stripe Webhook Verification
//!
//! Checks the `Stripe-Signature` header against the raw request body and
//! turns the event envelope into a [`WebhookEvent`].
//!
//! The signed message is `"{t}.{body}"` over the exact bytes received, so the
//! body must never be parsed and re-serialized before this runs.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pay_core::{PaymentError, PaymentResult, WebhookEvent};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the processor's signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// `t` exactly as sent; this is the text that was signed
    pub raw_timestamp: String,
    pub signatures: Vec<String>,
}

/// Parse `t=...,v1=...[,v1=...]`. Unknown schemes (e.g. `v0`) are skipped.
pub fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = value.parse::<i64>().ok().map(|ts| (ts, value.to_string()));
            }
            "v1" => {
                signatures.push(value.to_string());
            }
            _ => {}
        }
    }

    let (timestamp, raw_timestamp) = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        raw_timestamp,
        signatures,
    })
}

fn signed_mac(secret: &str, timestamp: &str, payload: &[u8]) -> PaymentResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Compute the hex-encoded v1 signature for a payload
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    let mac = signed_mac(secret, &timestamp.to_string(), payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a complete signature header, as the processor would send it
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)?
    ))
}

/// Verify a signature header against the raw payload.
///
/// Fails when the timestamp is further than `tolerance_secs` from `now` or
/// when no `v1` entry matches. Comparison is constant-time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> PaymentResult<()> {
    let parsed = parse_signature_header(header)?;

    // The timestamp is untrusted input; skew must not overflow.
    let within_tolerance = now
        .checked_sub(parsed.timestamp)
        .map(i64::unsigned_abs)
        .is_some_and(|skew| skew <= tolerance_secs.unsigned_abs());

    if !within_tolerance {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_mac(secret, &parsed.raw_timestamp, payload)?;

    let valid = parsed.signatures.iter().any(|sig| match hex::decode(sig) {
        Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
        Err(_) => false,
    });

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    livemode: bool,
    #[serde(default)]
    data: serde_json::Value,
}

/// Parse an event envelope without checking any signature
pub fn parse_event(payload: &[u8]) -> PaymentResult<WebhookEvent> {
    let envelope: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!(
        event_type = %envelope.event_type,
        event_id = envelope.id.as_deref().unwrap_or("-"),
        "Parsed webhook envelope"
    );

    WebhookEvent::from_parts(
        envelope.id,
        envelope
            .created
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        envelope.livemode,
        &envelope.event_type,
        envelope.data,
    )
}

/// Verify (when a secret is configured) and parse an inbound callback.
///
/// With `secret == None` the payload is trusted as-is; this is the
/// development mode and must be selected by leaving the secret unset.
pub fn construct_event(
    payload: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
    tolerance_secs: i64,
) -> PaymentResult<WebhookEvent> {
    if let Some(secret) = secret {
        let signature = signature.ok_or_else(|| {
            PaymentError::WebhookVerificationFailed("Missing Stripe-Signature header".to_string())
        })?;
        verify_signature(payload, signature, secret, tolerance_secs, Utc::now().timestamp())?;
    }

    parse_event(payload)
}
