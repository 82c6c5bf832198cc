//! # Stripe Payment Intents
//!
//! PaymentIntents API implementation used by the Payment Element flow: the
//! server creates an intent, the browser confirms it with the client secret.

use crate::config::StripeConfig;
use crate::webhook;
use async_trait::async_trait;
use chrono::Utc;
use pay_core::{
    PaymentError, PaymentProcessor, PaymentResult, PaymentSession, PaymentSessionRequest,
    WebhookEvent,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe PaymentIntents processor
pub struct StripePaymentIntents {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentIntents {
    /// Create a new processor. No request timeout is set beyond the client defaults.
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("payment-element/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    /// Access the loaded configuration
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build form data for the create call
    fn build_form(request: &PaymentSessionRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        for (key, value) in request.metadata() {
            form_params.push((format!("metadata[{}]", key), value.to_string()));
        }

        form_params
    }
}

#[async_trait]
impl PaymentProcessor for StripePaymentIntents {
    #[instrument(
        skip(self, request),
        fields(amount = request.amount, currency = %request.currency, order_reference = %request.order_reference)
    )]
    async fn create_payment_intent(
        &self,
        request: &PaymentSessionRequest,
    ) -> PaymentResult<PaymentSession> {
        let form_params = Self::build_form(request);
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        debug!("Creating Stripe payment intent");

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version);

        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = builder
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                if let Some(message) = error_response.error.message {
                    return Err(PaymentError::ProviderError {
                        provider: PROVIDER.to_string(),
                        message,
                    });
                }
            }

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("Payment processor returned HTTP {}", status.as_u16()),
            });
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("Unexpected payment processor response: {}", e),
            }
        })?;

        let client_secret = intent.client_secret.filter(|s| !s.is_empty()).ok_or_else(|| {
            PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: "Payment processor returned no client secret".to_string(),
            }
        })?;

        info!(
            payment_intent = %intent.id,
            status = %intent.status,
            "Created Stripe payment intent"
        );

        Ok(PaymentSession {
            payment_intent_id: intent.id,
            client_secret,
            amount: intent.amount.unwrap_or(request.amount),
            currency: intent.currency.unwrap_or_else(|| request.currency.clone()),
            status: intent.status,
            order_reference: request.order_reference.clone(),
            created_at: Utc::now(),
        })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> PaymentResult<WebhookEvent> {
        webhook::construct_event(
            payload,
            signature,
            self.config.webhook_secret.as_deref(),
            self.config.webhook_tolerance_secs,
        )
    }

    fn verifies_webhooks(&self) -> bool {
        self.config.verifies_webhooks()
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn processor(server: &MockServer) -> StripePaymentIntents {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri());
        StripePaymentIntents::new(config).unwrap()
    }

    #[test]
    fn test_form_carries_return_url_as_metadata() {
        let request = PaymentSessionRequest::new(1400, "usd", "https://x/thank-you");
        let form = StripePaymentIntents::build_form(&request);

        assert!(form.contains(&("amount".to_string(), "1400".to_string())));
        assert!(form.contains(&("currency".to_string(), "usd".to_string())));
        assert!(form.contains(&(
            "metadata[return_url]".to_string(),
            "https://x/thank-you".to_string()
        )));
        assert!(form.contains(&(
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string()
        )));
        assert!(!form.iter().any(|(k, _)| k == "return_url"));
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_abc123"))
            .and(header("stripe-version", "2023-10-16"))
            .and(body_string_contains("amount=1400"))
            .and(body_string_contains(
                "metadata%5Breturn_url%5D=https%3A%2F%2Fx%2Fthank-you",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 1400,
                "currency": "usd",
                "status": "requires_payment_method",
                "client_secret": "pi_123_secret_456"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = PaymentSessionRequest::new(1400, "usd", "https://x/thank-you");
        let session = processor(&server)
            .create_payment_intent(&request)
            .await
            .unwrap();

        assert_eq!(session.payment_intent_id, "pi_123");
        assert_eq!(session.client_secret, "pi_123_secret_456");
        assert_eq!(session.amount, 1400);
        assert_eq!(session.order_reference, request.order_reference);
    }

    #[tokio::test]
    async fn test_idempotency_key_forwarded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("idempotency-key", "checkout-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "status": "requires_payment_method",
                "client_secret": "pi_1_secret_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = PaymentSessionRequest::new(500, "eur", "https://x/done")
            .with_idempotency_key(Some("checkout-42".to_string()));
        let session = processor(&server)
            .create_payment_intent(&request)
            .await
            .unwrap();
        assert_eq!(session.currency, "eur");
    }

    #[tokio::test]
    async fn test_provider_error_message_passed_through() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "type": "invalid_request_error",
                    "code": "parameter_invalid_empty",
                    "message": "Invalid currency: xyz",
                    "param": "currency"
                }
            })))
            .mount(&server)
            .await;

        let request = PaymentSessionRequest::new(1400, "xyz", "https://x/thank-you");
        let err = processor(&server)
            .create_payment_intent(&request)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "Invalid currency: xyz");
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let request = PaymentSessionRequest::new(1400, "usd", "https://x/thank-you");
        let err = processor(&server)
            .create_payment_intent(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::ProviderError { .. }));
        assert!(err.public_message().contains("502"));
    }

    #[tokio::test]
    async fn test_unreachable_processor_is_network_error() {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url("http://127.0.0.1:1");
        let processor = StripePaymentIntents::new(config).unwrap();

        let request = PaymentSessionRequest::new(1400, "usd", "https://x/thank-you");
        let err = processor.create_payment_intent(&request).await.unwrap_err();

        assert!(matches!(err, PaymentError::NetworkError(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_processor_reports_verification_mode() {
        let strict = StripePaymentIntents::new(
            StripeConfig::new("sk_test_abc").with_webhook_secret("whsec_x"),
        )
        .unwrap();
        assert!(strict.verifies_webhooks());
        assert_eq!(strict.provider_name(), "stripe");

        let relaxed = StripePaymentIntents::new(StripeConfig::new("sk_test_abc")).unwrap();
        assert!(!relaxed.verifies_webhooks());
    }
}
