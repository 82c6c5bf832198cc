//! # pay-stripe
//!
//! Stripe payment processor for the payment-element backend.
//!
//! - **StripePaymentIntents** - PaymentIntents API, used with the Payment
//!   Element: the server creates an intent and hands its client secret to
//!   the browser, which confirms the payment directly with Stripe.
//! - **webhook** - `Stripe-Signature` verification over the raw body and
//!   event envelope parsing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::StripePaymentIntents;
//! use pay_core::{PaymentProcessor, PaymentSessionRequest};
//!
//! let processor = StripePaymentIntents::from_env()?;
//!
//! let request = PaymentSessionRequest::new(1400, "usd", "https://shop.example/thank-you");
//! let session = processor.create_payment_intent(&request).await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use pay_core::{dispatch_webhook_event, LoggingWebhookHandler};
//!
//! // `body` must be the raw request bytes
//! let event = processor.construct_event(&body, signature)?;
//! dispatch_webhook_event(&LoggingWebhookHandler, event)?;
//! ```

pub mod config;
pub mod intents;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripePaymentIntents;
pub use webhook::{construct_event, signature_header, verify_signature, SIGNATURE_HEADER};
