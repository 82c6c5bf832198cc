//! # Payment Processor Trait
//!
//! The contract this backend consumes from the payment processor: create a
//! payment intent and turn an inbound callback into a trusted event.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 PaymentProcessor (trait)                    │
//! │  ├── create_payment_intent()                                │
//! │  ├── construct_event()                                      │
//! │  ├── verifies_webhooks()                                    │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                   ┌────────┴────────┐
//!                   │ StripePayment   │
//!                   │    Intents      │
//!                   └─────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::event::WebhookEvent;
use crate::session::{PaymentSession, PaymentSessionRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for payment processor implementations.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent and return the session holding its client secret.
    ///
    /// The request has already been validated by the caller. The return URL is
    /// attached as intent metadata, not as a processor redirect setting.
    async fn create_payment_intent(
        &self,
        request: &PaymentSessionRequest,
    ) -> PaymentResult<PaymentSession>;

    /// Turn a raw callback body into an event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes, exactly as received
    /// * `signature` - Signature header from the request, if any
    ///
    /// When the processor is configured with a signing secret the signature is
    /// mandatory and checked against `payload` before anything is parsed.
    fn construct_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> PaymentResult<WebhookEvent>;

    /// Whether `construct_event` enforces signatures.
    fn verifies_webhooks(&self) -> bool;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment processor (dynamic dispatch)
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;
