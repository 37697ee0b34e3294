//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 8787)
//! - `SHOPIFY_API_VERSION` - Admin REST API version (default: 2024-01)
//! - `SHOPIFY_ADMIN_ORIGIN` - Fixed origin for Admin API calls, shop moved
//!   into the path (local mocks only)
//! - `SHOPIFY_WEBHOOK_SECRET` - Shared secret for `X-Shopify-Hmac-Sha256`
//!   verification; verification is skipped when unset
//! - `REVIEW_REQUEST_DELAY_DAYS` - Days between fulfillment and review request (default: 7)
//! - `REVIEW_EMAIL_DELAY_MS` - Simulated delivery delay for review emails (default: 1000)
//! - `REVIEW_EMAIL_FROM` - Sender mailbox for review emails
//!   (default: `TrustLoop Reviews <reviews@trustloop.app>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//!
//! ## Optional (TLS)
//! - `GATEWAY_TLS_CERT` - PEM-encoded certificate chain
//! - `GATEWAY_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "2024-01";
const DEFAULT_REVIEW_DELAY_DAYS: i64 = 7;
const MAX_REVIEW_DELAY_DAYS: i64 = 365;
const DEFAULT_EMAIL_DELAY_MS: u64 = 1000;
const DEFAULT_EMAIL_FROM: &str = "TrustLoop Reviews <reviews@trustloop.app>";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API settings
    pub shopify: ShopifyConfig,
    /// Webhook receiver settings
    pub webhooks: WebhookConfig,
    /// Review request timing
    pub reviews: ReviewConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Shopify Admin REST API settings.
///
/// Access tokens are per request and never part of configuration.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Admin API version segment (e.g., 2024-01)
    pub api_version: String,
    /// Fixed origin replacing `https://{shop}` for every call
    pub admin_origin: Option<Url>,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            admin_origin: None,
        }
    }
}

/// Webhook receiver settings.
///
/// Implements `Debug` manually to redact the shared secret.
#[derive(Clone, Default)]
pub struct WebhookConfig {
    /// Shared secret for HMAC verification of inbound webhooks
    pub secret: Option<SecretString>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Review request timing.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Days between fulfillment and the review request
    pub request_delay_days: i64,
    /// Simulated delivery delay for the review email stub
    pub email_delay: Duration,
    /// Sender mailbox for review emails
    pub email_from: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            request_delay_days: DEFAULT_REVIEW_DELAY_DAYS,
            email_delay: Duration::from_millis(DEFAULT_EMAIL_DELAY_MS),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}

impl ReviewConfig {
    /// Delay between fulfillment and review request.
    #[must_use]
    pub fn request_delay(&self) -> chrono::Duration {
        chrono::Duration::days(self.request_delay_days)
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("GATEWAY_TLS_CERT");
        let key_pem = get_optional_env("GATEWAY_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "GATEWAY_TLS_*".to_string(),
                "Both GATEWAY_TLS_CERT and GATEWAY_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// TLS pair is only half set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("GATEWAY_HOST", "127.0.0.1")?;
        let port = parse_env("GATEWAY_PORT", "8787")?;

        let shopify = ShopifyConfig::from_env()?;
        let webhooks = WebhookConfig::from_env();
        let reviews = ReviewConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            shopify,
            webhooks,
            reviews,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Configuration for tests and local tooling: loopback, ephemeral port,
    /// no Sentry, no TLS, no webhook secret.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            shopify: ShopifyConfig::default(),
            webhooks: WebhookConfig::default(),
            reviews: ReviewConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let admin_origin = get_optional_env("SHOPIFY_ADMIN_ORIGIN")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPIFY_ADMIN_ORIGIN".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            admin_origin,
        })
    }
}

impl WebhookConfig {
    /// Load webhook settings from environment.
    ///
    /// A weak secret is accepted with a warning; a missing one disables
    /// signature verification.
    fn from_env() -> Self {
        let secret = get_optional_env("SHOPIFY_WEBHOOK_SECRET").map(|secret| {
            if let Err(e) = validate_secret_strength(&secret, "SHOPIFY_WEBHOOK_SECRET") {
                tracing::warn!("SHOPIFY_WEBHOOK_SECRET validation warning: {e}");
            }
            SecretString::from(secret)
        });
        Self { secret }
    }
}

impl ReviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let request_delay_days = parse_env(
            "REVIEW_REQUEST_DELAY_DAYS",
            &DEFAULT_REVIEW_DELAY_DAYS.to_string(),
        )?;
        if !(0..=MAX_REVIEW_DELAY_DAYS).contains(&request_delay_days) {
            return Err(ConfigError::InvalidEnvVar(
                "REVIEW_REQUEST_DELAY_DAYS".to_string(),
                format!("must be between 0 and {MAX_REVIEW_DELAY_DAYS}"),
            ));
        }
        let email_delay_ms: u64 =
            parse_env("REVIEW_EMAIL_DELAY_MS", &DEFAULT_EMAIL_DELAY_MS.to_string())?;

        Ok(Self {
            request_delay_days,
            email_delay: Duration::from_millis(email_delay_ms),
            email_from: get_env_or_default("REVIEW_EMAIL_FROM", DEFAULT_EMAIL_FROM),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
