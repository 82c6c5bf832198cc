//! # Webhook Dispatch
//!
//! Maps verified events to local side effects. Each event is dispatched at
//! most once per delivery; unknown event types never reach a handler and are
//! never an error.

use crate::error::{PaymentError, PaymentResult};
use crate::event::{PaymentIntentEvent, WebhookEvent, WebhookEventKind};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Webhook event handler trait
///
/// Implement this trait to hook order fulfillment or customer notification
/// into the webhook path. The processor delivers at least once and possibly
/// out of order, so implementations must tolerate duplicates (`event_id` is
/// the processor's dedupe key).
pub trait WebhookHandler: Send + Sync {
    /// Called when a payment intent succeeds
    fn on_payment_succeeded(
        &self,
        event_id: Option<&str>,
        intent: &PaymentIntentEvent,
    ) -> PaymentResult<()> {
        info!(
            event_id = event_id.unwrap_or("-"),
            payment_intent = %intent.id,
            amount = intent.amount,
            currency = intent.currency.as_deref().unwrap_or("-"),
            order_reference = intent.order_reference().unwrap_or("-"),
            "💰 Payment captured"
        );
        Ok(())
    }

    /// Called when a payment attempt fails
    fn on_payment_failed(
        &self,
        event_id: Option<&str>,
        intent: &PaymentIntentEvent,
    ) -> PaymentResult<()> {
        warn!(
            event_id = event_id.unwrap_or("-"),
            payment_intent = %intent.id,
            order_reference = intent.order_reference().unwrap_or("-"),
            reason = intent.failure_message().unwrap_or("unknown"),
            "❌ Payment failed"
        );
        Ok(())
    }
}

/// Default webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Type alias for a shared handler (dynamic dispatch)
pub type BoxedWebhookHandler = Arc<dyn WebhookHandler>;

/// What the dispatcher did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran for this event type
    Handled(&'static str),
    /// Unknown event type; acknowledged without side effects
    Ignored(String),
}

/// Dispatch a webhook event to the appropriate handler method.
///
/// Handler errors and handler panics both come back as
/// `PaymentError::Dispatch`; the caller picks the response code.
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: WebhookEvent,
) -> PaymentResult<DispatchOutcome> {
    let event_id = event.event_id.as_deref();

    match &event.kind {
        WebhookEventKind::PaymentSucceeded(intent) => {
            run_guarded(crate::event::PAYMENT_SUCCEEDED, || {
                handler.on_payment_succeeded(event_id, intent)
            })
        }
        WebhookEventKind::PaymentFailed(intent) => {
            run_guarded(crate::event::PAYMENT_FAILED, || {
                handler.on_payment_failed(event_id, intent)
            })
        }
        WebhookEventKind::Unknown { event_type, .. } => {
            debug!(event_type = %event_type, "Unhandled webhook event");
            Ok(DispatchOutcome::Ignored(event_type.clone()))
        }
    }
}

fn run_guarded<F>(event_type: &'static str, f: F) -> PaymentResult<DispatchOutcome>
where
    F: FnOnce() -> PaymentResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(DispatchOutcome::Handled(event_type)),
        Ok(Err(PaymentError::Dispatch { event_type, message })) => {
            Err(PaymentError::Dispatch { event_type, message })
        }
        Ok(Err(e)) => Err(PaymentError::Dispatch {
            event_type: event_type.to_string(),
            message: e.to_string(),
        }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            Err(PaymentError::Dispatch {
                event_type: event_type.to_string(),
                message: format!("handler panicked: {}", message),
            })
        }
    }
}

/// Response policy when a handler fails on a verified event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchFailurePolicy {
    /// Log and answer 200; the processor will not redeliver
    #[default]
    Acknowledge,
    /// Answer 500 so the processor redelivers (at-least-once processing)
    Redeliver,
}

impl DispatchFailurePolicy {
    /// HTTP status to answer with after a failed dispatch
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchFailurePolicy::Acknowledge => 200,
            DispatchFailurePolicy::Redeliver => 500,
        }
    }
}

impl FromStr for DispatchFailurePolicy {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acknowledge" | "ack" => Ok(Self::Acknowledge),
            "redeliver" | "retry" => Ok(Self::Redeliver),
            other => Err(PaymentError::Configuration(format!(
                "unknown webhook handler failure policy: {} (expected acknowledge or redeliver)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PAYMENT_FAILED, PAYMENT_SUCCEEDED};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        succeeded: AtomicUsize,
        failed: AtomicUsize,
    }

    impl WebhookHandler for CountingHandler {
        fn on_payment_succeeded(&self, _: Option<&str>, _: &PaymentIntentEvent) -> PaymentResult<()> {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_payment_failed(&self, _: Option<&str>, _: &PaymentIntentEvent) -> PaymentResult<()> {
            self.failed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn event(event_type: &str) -> WebhookEvent {
        WebhookEvent::from_parts(
            Some("evt_test".into()),
            None,
            false,
            event_type,
            json!({ "object": { "id": "pi_test" } }),
        )
        .unwrap()
    }

    #[test]
    fn test_dispatch_success() {
        let handler = CountingHandler::default();
        let outcome = dispatch_webhook_event(&handler, event(PAYMENT_SUCCEEDED)).unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled(PAYMENT_SUCCEEDED));
        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 1);
        assert_eq!(handler.failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_failure() {
        let handler = CountingHandler::default();
        let outcome = dispatch_webhook_event(&handler, event(PAYMENT_FAILED)).unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled(PAYMENT_FAILED));
        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 0);
        assert_eq!(handler.failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let handler = CountingHandler::default();
        let outcome = dispatch_webhook_event(&handler, event("customer.created")).unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored("customer.created".into()));
        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 0);
        assert_eq!(handler.failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_error_becomes_dispatch_error() {
        struct Failing;
        impl WebhookHandler for Failing {
            fn on_payment_succeeded(&self, _: Option<&str>, _: &PaymentIntentEvent) -> PaymentResult<()> {
                Err(PaymentError::Internal("fulfillment offline".into()))
            }
        }

        let err = dispatch_webhook_event(&Failing, event(PAYMENT_SUCCEEDED)).unwrap_err();
        match err {
            PaymentError::Dispatch { event_type, message } => {
                assert_eq!(event_type, PAYMENT_SUCCEEDED);
                assert!(message.contains("fulfillment offline"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_handler_panic_is_caught() {
        struct Panicking;
        impl WebhookHandler for Panicking {
            fn on_payment_failed(&self, _: Option<&str>, _: &PaymentIntentEvent) -> PaymentResult<()> {
                panic!("boom");
            }
        }

        let err = dispatch_webhook_event(&Panicking, event(PAYMENT_FAILED)).unwrap_err();
        assert!(matches!(err, PaymentError::Dispatch { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!(
            "acknowledge".parse::<DispatchFailurePolicy>().unwrap(),
            DispatchFailurePolicy::Acknowledge
        );
        assert_eq!(
            "Redeliver".parse::<DispatchFailurePolicy>().unwrap(),
            DispatchFailurePolicy::Redeliver
        );
        assert!("sometimes".parse::<DispatchFailurePolicy>().is_err());
        assert_eq!(DispatchFailurePolicy::default().status_code(), 200);
        assert_eq!(DispatchFailurePolicy::Redeliver.status_code(), 500);
    }
}
