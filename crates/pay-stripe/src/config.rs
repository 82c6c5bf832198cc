//! # Stripe Configuration
//!
//! Configuration management for the Stripe integration.
//! All secrets are loaded from environment variables.

use pay_core::PaymentError;
use std::env;
use std::fmt;

/// Default Stripe API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// API version pinned for every outbound call
pub const DEFAULT_API_VERSION: &str = "2023-10-16";

/// Default accepted skew between a signature timestamp and now
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...). `None` selects unverified mode.
    pub webhook_secret: Option<String>,

    /// Signature timestamp tolerance in seconds
    pub webhook_tolerance_secs: i64,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PROCESSOR_SECRET_KEY`
    ///
    /// Optional:
    /// - `WEBHOOK_SIGNING_SECRET`
    /// - `WEBHOOK_TOLERANCE_SECS`
    /// - `PROCESSOR_API_BASE`
    /// - `PROCESSOR_API_VERSION`
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PaymentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = non_empty("PROCESSOR_SECRET_KEY").ok_or_else(|| {
            PaymentError::Configuration("PROCESSOR_SECRET_KEY not set".to_string())
        })?;

        let webhook_tolerance_secs = match non_empty("WEBHOOK_TOLERANCE_SECS") {
            Some(raw) => raw.trim().parse::<i64>().ok().filter(|t| *t > 0).ok_or_else(|| {
                PaymentError::Configuration(format!(
                    "WEBHOOK_TOLERANCE_SECS must be a positive integer, got {}",
                    raw
                ))
            })?,
            None => DEFAULT_WEBHOOK_TOLERANCE_SECS,
        };

        Ok(Self {
            secret_key,
            webhook_secret: non_empty("WEBHOOK_SIGNING_SECRET"),
            webhook_tolerance_secs,
            api_base_url: non_empty("PROCESSOR_API_BASE")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_version: non_empty("PROCESSOR_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: None,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.secret_key.starts_with("rk_test_")
    }

    /// Check if webhook signatures are enforced
    pub fn verifies_webhooks(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: enable strict webhook verification
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[redacted]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let config = StripeConfig::from_lookup(lookup(&[("PROCESSOR_SECRET_KEY", "sk_test_abc")])).unwrap();

        assert!(config.is_test_mode());
        assert!(!config.verifies_webhooks());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.webhook_tolerance_secs, 300);
    }

    #[test]
    fn test_missing_secret_key() {
        let result = StripeConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(PaymentError::Configuration(_))));

        let result = StripeConfig::from_lookup(lookup(&[("PROCESSOR_SECRET_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_webhook_secret_toggles_verification() {
        let config = StripeConfig::from_lookup(lookup(&[
            ("PROCESSOR_SECRET_KEY", "sk_test_abc"),
            ("WEBHOOK_SIGNING_SECRET", "whsec_123"),
        ]))
        .unwrap();
        assert!(config.verifies_webhooks());

        let config = StripeConfig::from_lookup(lookup(&[
            ("PROCESSOR_SECRET_KEY", "sk_test_abc"),
            ("WEBHOOK_SIGNING_SECRET", ""),
        ]))
        .unwrap();
        assert!(!config.verifies_webhooks());
    }

    #[test]
    fn test_tolerance_and_base_url() {
        let config = StripeConfig::from_lookup(lookup(&[
            ("PROCESSOR_SECRET_KEY", "sk_live_abc"),
            ("WEBHOOK_TOLERANCE_SECS", "60"),
            ("PROCESSOR_API_BASE", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();
        assert!(!config.is_test_mode());
        assert_eq!(config.webhook_tolerance_secs, 60);
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");

        let result = StripeConfig::from_lookup(lookup(&[
            ("PROCESSOR_SECRET_KEY", "sk_test_abc"),
            ("WEBHOOK_TOLERANCE_SECS", "-5"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StripeConfig::new("sk_test_abc123").with_webhook_secret("whsec_topsecret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk_test_abc123"));
        assert!(!rendered.contains("whsec_topsecret"));
    }
}
