//! # Request Handlers
//!
//! Axum request handlers for the payment API: config bootstrap, payment
//! session creation, webhook intake and the site entry document.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use pay_core::{
    dispatch_webhook_event, DispatchOutcome, PaymentError, PaymentSessionRequest, PublicConfig,
};
use pay_stripe::SIGNATURE_HEADER;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment intent request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Amount in minor currency units
    pub amount: i64,
    /// ISO currency code
    pub currency: String,
    /// Absolute URL the browser returns to after redirect-based methods
    #[serde(alias = "returnUrl")]
    pub return_url: String,
    /// Idempotency key (optional, the `Idempotency-Key` header wins)
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Create payment intent response. Only the client secret crosses to the browser.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// Error response: `{"error": {"message": "..."}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.public_message())))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "payment-element",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Site entry document
pub async fn index(State(state): State<AppState>) -> Response {
    let index_path = state.config.static_dir.join("index.html");

    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            debug!("Cannot read {}: {}", index_path.display(), e);
            (StatusCode::NOT_FOUND, "index.html not found.").into_response()
        }
    }
}

/// Publishable key for the frontend
pub async fn get_config(State(state): State<AppState>) -> Result<Json<PublicConfig>, ApiError> {
    PublicConfig::from_key(state.config.publishable_key.as_deref())
        .map(Json)
        .map_err(|e| {
            error!("Config requested but unavailable: {}", e);
            payment_error_to_response(e)
        })
}

/// Create a payment intent and return its client secret
#[instrument(skip(state, headers, payload))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected payment intent request: {}", rejection.body_text());
        payment_error_to_response(PaymentError::InvalidRequest(rejection.body_text()))
    })?;

    let header_key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let request = PaymentSessionRequest::new(body.amount, body.currency, body.return_url)
        .with_idempotency_key(header_key.or(body.idempotency_key));

    request.validate().map_err(|e| {
        warn!("Invalid payment intent request: {}", e);
        payment_error_to_response(e)
    })?;

    info!(
        "Creating payment intent: amount={}, currency={}, return_url={}",
        request.amount, request.currency, request.return_url
    );

    let session = state
        .processor
        .create_payment_intent(&request)
        .await
        .map_err(|e| {
            error!(
                retryable = e.is_retryable(),
                "Failed to create payment intent: {}",
                e
            );
            payment_error_to_response(e)
        })?;

    info!(
        "Created payment intent {} (order_reference={})",
        session.payment_intent_id, session.order_reference
    );

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: session.client_secret,
    }))
}

/// Handle processor webhook.
///
/// `body` is taken as raw bytes and handed to verification untouched; no JSON
/// extractor may run on this route.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let event = match state.processor.construct_event(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            warn!("⚠️  Webhook rejected: {}", e);
            return StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        }
    };

    info!(
        handled = event.is_handled(),
        "Received webhook: type={}, id={}",
        event.event_type(),
        event.event_id.as_deref().unwrap_or("-")
    );

    // Handler failures never crash the process; the configured policy
    // decides between acknowledging and asking for redelivery.
    match dispatch_webhook_event(state.webhook_handler.as_ref(), event) {
        Ok(DispatchOutcome::Handled(event_type)) => {
            debug!("Dispatched {}", event_type);
            StatusCode::OK
        }
        Ok(DispatchOutcome::Ignored(event_type)) => {
            debug!("Acknowledged unhandled event {}", event_type);
            StatusCode::OK
        }
        Err(e) => {
            let policy = state.config.dispatch_failure;
            error!("Webhook handler error ({:?}): {}", policy, e);
            StatusCode::from_u16(policy.status_code()).unwrap_or(StatusCode::OK)
        }
    }
}
