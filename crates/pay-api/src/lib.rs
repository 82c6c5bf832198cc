//! # pay-api
//!
//! HTTP API layer for the payment-element backend.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Config and payment intent endpoints for the checkout page
//! - Webhook handler for processor callbacks
//! - Static file serving for the frontend bundle
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Entry document |
//! | GET | `/config` | Publishable key |
//! | POST | `/create-payment-intent` | Create payment intent |
//! | POST | `/webhook` | Processor webhook |
//! | GET | `/health` | Health check |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, LogFormat};
