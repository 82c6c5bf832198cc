//! # Payment Element backend
//!
//! Serves the checkout page, creates payment intents and consumes
//! processor webhooks.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export PROCESSOR_SECRET_KEY=sk_test_...
//! export PROCESSOR_PUBLISHABLE_KEY=pk_test_...
//! export WEBHOOK_SIGNING_SECRET=whsec_...
//!
//! # Run the server
//! payment-element
//! ```

use pay_api::{routes, AppConfig, AppState, LogFormat};
use pay_core::HANDLED_WEBHOOK_EVENTS;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with((!json).then(|| fmt::layer()))
        .with(json.then(|| fmt::layer().json()))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let addr = config.socket_addr()?;
    let is_prod = config.is_production();

    info!("Environment: {}", config.environment);
    info!("Static directory: {}", config.static_dir.display());

    // Initialize application state
    let state = AppState::new(config)?;

    info!("Payment processor: {}", state.processor.provider_name());
    info!("Handled webhook events: {:?}", HANDLED_WEBHOOK_EVENTS);

    // Create router
    let app = routes::create_router(state);

    info!("🚀 Payment backend starting on http://{}", addr);

    if !is_prod {
        info!("💳 Checkout page: http://{}/", addr);
        info!("🔔 Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  💳 Payment Element 💳
  ━━━━━━━━━━━━━━━━━━━━━━━
  Checkout backend
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
