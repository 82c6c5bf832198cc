//! # Payment Session Types
//!
//! Request and result types for payment session creation. A session is a
//! processor-side payment intent; only its client secret reaches the browser.

use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key under which the return URL travels with the intent
pub const RETURN_URL_METADATA_KEY: &str = "return_url";

/// Metadata key under which the local order reference travels with the intent
pub const ORDER_REFERENCE_METADATA_KEY: &str = "order_reference";

/// A request to open a payment session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSessionRequest {
    /// Amount in minor currency units (cents)
    pub amount: i64,

    /// ISO currency code, lower-cased
    pub currency: String,

    /// Absolute URL the browser lands on after redirect-based payment methods
    pub return_url: String,

    /// Caller-supplied key forwarded to the processor to collapse duplicates
    pub idempotency_key: Option<String>,

    /// Locally generated reference, carried as metadata for fulfillment
    pub order_reference: String,
}

impl PaymentSessionRequest {
    /// Create a request with a fresh order reference
    pub fn new(amount: i64, currency: impl Into<String>, return_url: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().trim().to_lowercase(),
            return_url: return_url.into().trim().to_string(),
            idempotency_key: None,
            order_reference: Uuid::new_v4().to_string(),
        }
    }

    /// Builder: attach an idempotency key (blank keys are ignored)
    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    /// Check the request before any processor call is made.
    ///
    /// Currency codes are only checked for presence; the processor owns the
    /// list of supported currencies.
    pub fn validate(&self) -> PaymentResult<()> {
        if self.amount <= 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "amount must be a positive integer, got {}",
                self.amount
            )));
        }

        if self.currency.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "currency is required".to_string(),
            ));
        }

        if !is_absolute_http_url(&self.return_url) {
            return Err(PaymentError::InvalidRequest(
                "return_url must be an absolute http(s) URL".to_string(),
            ));
        }

        Ok(())
    }

    /// Metadata pairs to attach to the processor-side intent
    pub fn metadata(&self) -> Vec<(&'static str, &str)> {
        vec![
            (RETURN_URL_METADATA_KEY, self.return_url.as_str()),
            (ORDER_REFERENCE_METADATA_KEY, self.order_reference.as_str()),
        ]
    }
}

fn is_absolute_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !url.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A created payment session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Processor payment intent ID (pi_...)
    pub payment_intent_id: String,

    /// Opaque secret the browser uses to confirm the payment
    pub client_secret: String,

    /// Amount in minor units as accepted by the processor
    pub amount: i64,

    /// Currency as accepted by the processor
    pub currency: String,

    /// Processor-reported intent status
    pub status: String,

    /// Local order reference from the request
    pub order_reference: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Publishable configuration handed to the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub publishable_key: String,
}

impl PublicConfig {
    /// Build from an optionally configured key.
    ///
    /// A missing or blank key is a configuration error; the frontend must not
    /// start a payment flow without one.
    pub fn from_key(publishable_key: Option<&str>) -> PaymentResult<Self> {
        match publishable_key {
            Some(key) if !key.trim().is_empty() => Ok(Self {
                publishable_key: key.to_string(),
            }),
            _ => Err(PaymentError::Configuration(
                "publishable key is not configured".to_string(),
            )),
        }
    }
}
