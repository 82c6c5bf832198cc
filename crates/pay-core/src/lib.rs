//! # pay-core
//!
//! Core types and traits for the payment-element backend.
//!
//! This crate provides:
//! - `PaymentProcessor` trait for the external payment processor
//! - `PaymentSessionRequest` and `PaymentSession` for session creation
//! - `PublicConfig` for the frontend bootstrap
//! - `WebhookEvent` and the `WebhookHandler` dispatcher for callbacks
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{PaymentSessionRequest, PaymentProcessor, dispatch_webhook_event};
//!
//! let request = PaymentSessionRequest::new(1400, "usd", "https://shop.example/thank-you");
//! request.validate()?;
//! let session = processor.create_payment_intent(&request).await?;
//! // Hand session.client_secret to the browser
//!
//! // Later, in the webhook endpoint:
//! let event = processor.construct_event(&body, Some(signature))?;
//! dispatch_webhook_event(&LoggingWebhookHandler, event)?;
//! ```

pub mod error;
pub mod event;
pub mod processor;
pub mod session;
pub mod webhook;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use event::{
    LastPaymentError, PaymentIntentEvent, WebhookEvent, WebhookEventKind,
    HANDLED_WEBHOOK_EVENTS, PAYMENT_FAILED, PAYMENT_SUCCEEDED,
};
pub use processor::{BoxedPaymentProcessor, PaymentProcessor};
pub use session::{PaymentSession, PaymentSessionRequest, PublicConfig};
pub use webhook::{
    dispatch_webhook_event, BoxedWebhookHandler, DispatchFailurePolicy, DispatchOutcome,
    LoggingWebhookHandler, WebhookHandler,
};
