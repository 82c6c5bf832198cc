//! # Application State
//!
//! Configuration loaded once at startup and handed to every handler through
//! axum `State`. Nothing in here is mutated after construction.

use pay_core::{
    BoxedPaymentProcessor, BoxedWebhookHandler, DispatchFailurePolicy, LoggingWebhookHandler,
    PaymentError, PaymentResult,
};
use pay_stripe::StripePaymentIntents;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Directory served as the site root
    pub static_dir: PathBuf,
    /// Publishable key served by `/config`
    pub publishable_key: Option<String>,
    /// Response policy when a webhook handler fails
    pub dispatch_failure: DispatchFailurePolicy,
    /// Log output format
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> PaymentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                PaymentError::Configuration(format!("PORT must be a port number, got {}", raw))
            })?,
            None => 4242,
        };

        let dispatch_failure = match non_empty("WEBHOOK_HANDLER_FAILURE") {
            Some(raw) => raw.parse()?,
            None => DispatchFailurePolicy::default(),
        };

        let log_format = match non_empty("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            environment: non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            static_dir: non_empty("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            publishable_key: non_empty("PROCESSOR_PUBLISHABLE_KEY"),
            dispatch_failure,
            log_format,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> PaymentResult<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            PaymentError::Configuration(format!("Invalid bind address {}:{}", self.host, self.port))
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Payment processor
    pub processor: BoxedPaymentProcessor,
    /// Side effects for verified webhook events
    pub webhook_handler: BoxedWebhookHandler,
}

impl AppState {
    /// Create the state with the Stripe processor and the logging handler
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let processor = StripePaymentIntents::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        if processor.config().is_test_mode() {
            info!("Stripe running with test-mode keys");
        }

        let state = Self::build(
            config,
            Arc::new(processor),
            Arc::new(LoggingWebhookHandler),
        )?;
        Ok(state)
    }

    /// Assemble state from explicit parts.
    ///
    /// Refuses to run unsigned webhooks in production and creates the static
    /// directory when it does not exist yet.
    pub fn build(
        config: AppConfig,
        processor: BoxedPaymentProcessor,
        webhook_handler: BoxedWebhookHandler,
    ) -> PaymentResult<Self> {
        if processor.verifies_webhooks() {
            info!("Webhook signature verification enabled");
        } else if config.is_production() {
            return Err(PaymentError::Configuration(
                "WEBHOOK_SIGNING_SECRET must be set when ENVIRONMENT=production".to_string(),
            ));
        } else {
            warn!("WEBHOOK_SIGNING_SECRET not set: webhook payloads are trusted without verification");
        }

        if config.publishable_key.is_none() {
            warn!("PROCESSOR_PUBLISHABLE_KEY not set: /config will answer with a configuration error");
        }

        ensure_static_dir(&config.static_dir)?;

        Ok(Self {
            config: Arc::new(config),
            processor,
            webhook_handler,
        })
    }
}

fn ensure_static_dir(dir: &Path) -> PaymentResult<()> {
    if dir.is_dir() {
        return Ok(());
    }

    warn!("Static directory {} does not exist, creating it", dir.display());
    std::fs::create_dir_all(dir).map_err(|e| {
        PaymentError::Configuration(format!(
            "Failed to create static directory {}: {}",
            dir.display(),
            e
        ))
    })
}
