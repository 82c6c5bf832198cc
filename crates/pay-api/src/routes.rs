//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Browser-facing (CORS enabled):
///   - GET  / - Entry document (index.html) or 404
///   - GET  /config - Publishable key
///   - POST /create-payment-intent - Create payment intent
///   - GET  /health - Health check
///
/// - Webhooks (no CORS, raw body):
///   - POST /webhook - Processor callbacks
///
/// - Everything else is served from the static directory.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let browser_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/config", get(handlers::get_config))
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/health", get(handlers::health))
        .layer(cors);

    let webhook_routes = Router::new().route("/webhook", post(handlers::webhook));

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .merge(browser_routes)
        .merge(webhook_routes)
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
