//! # Payment Error Types
//!
//! Typed error handling for the payment-element backend.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or out-of-range session request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment processor rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with the processor
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// A handler for a verified event failed
    #[error("Webhook dispatch failed for {event_type}: {message}")]
    Dispatch { event_type: String, message: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns true if the processor call might succeed when resubmitted.
    /// Nothing in this crate retries; the frontend decides.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::NetworkError(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::ProviderError { .. } => 400,
            PaymentError::NetworkError(_) => 400,
            PaymentError::WebhookVerificationFailed(_) => 400,
            PaymentError::WebhookParseError(_) => 400,
            PaymentError::Dispatch { .. } => 500,
            PaymentError::Internal(_) => 500,
        }
    }

    /// Message safe to hand to the browser.
    ///
    /// Processor messages (e.g. a declined card) pass through verbatim so the
    /// frontend can display them; transport details never leave the server.
    pub fn public_message(&self) -> String {
        match self {
            PaymentError::ProviderError { message, .. } => message.clone(),
            PaymentError::InvalidRequest(message) => message.clone(),
            PaymentError::NetworkError(_) => {
                "Unable to reach the payment processor".to_string()
            }
            PaymentError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
