//! Web application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SELLAPP_BASE_URL` - Public URL of this application
//! - `SELLAPP_API_URL` - Base URL of the external POS API
//!
//! ## Optional
//! - `SELLAPP_HOST` - Bind address (default: 127.0.0.1)
//! - `SELLAPP_PORT` - Listen port (default: 3000)
//! - `SELLAPP_API_BASE_PATH` - Path prefix for API calls (default: empty)
//! - `SELLAPP_API_TOKEN` - Service bearer token used when no user token is available
//! - `SELLAPP_API_TIMEOUT_SECS` - Per-request API timeout (default: 30)
//! - `SELLAPP_CURRENCY_SYMBOL` - Currency symbol for display (default: GH₵)
//! - `SELLAPP_CATALOG_CACHE_SECS` - POS product cache TTL (default: 30)
//! - `SELLAPP_POLL_CHARTS_SECS` - Analytics charts refresh (default: 30)
//! - `SELLAPP_POLL_QUICK_STATS_SECS` - Quick stats refresh (default: 30)
//! - `SELLAPP_POLL_ALERTS_SECS` - Alerts refresh (default: 60)
//! - `SELLAPP_POLL_AUDIT_SECS` - Audit log refresh (default: 60)
//! - `SELLAPP_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CURRENCY_SYMBOL: &str = "GH₵";

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
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this application
    pub base_url: String,
    /// External POS API settings
    pub api: ApiConfig,
    /// Currency symbol shown next to amounts
    pub currency_symbol: String,
    /// POS product cache TTL
    pub catalog_cache_ttl: Duration,
    /// Live feed refresh intervals
    pub poll: PollIntervals,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// External POS API configuration.
///
/// Implements `Debug` manually to redact the service token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Scheme, host and port of the API
    pub url: Url,
    /// Path prefix prepended to every endpoint (e.g. `/v1`)
    pub base_path: String,
    /// Service token used when the request carries no user token
    pub service_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url.as_str())
            .field("base_path", &self.base_path)
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Refresh intervals for the dashboard live feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub charts: Duration,
    pub quick_stats: Duration,
    pub alerts: Duration,
    pub audit_logs: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            charts: Duration::from_secs(30),
            quick_stats: Duration::from_secs(30),
            alerts: Duration::from_secs(60),
            audit_logs: Duration::from_secs(60),
        }
    }
}

impl PollIntervals {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            charts: get_duration_secs("SELLAPP_POLL_CHARTS_SECS", defaults.charts)?,
            quick_stats: get_duration_secs("SELLAPP_POLL_QUICK_STATS_SECS", defaults.quick_stats)?,
            alerts: get_duration_secs("SELLAPP_POLL_ALERTS_SECS", defaults.alerts)?,
            audit_logs: get_duration_secs("SELLAPP_POLL_AUDIT_SECS", defaults.audit_logs)?,
        })
    }
}

impl ApiConfig {
    /// Load just the API settings, for tools that talk to the API without
    /// serving pages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SELLAPP_API_URL` is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("SELLAPP_API_URL")?;
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SELLAPP_API_URL".to_string(), e.to_string()))?;

        let service_token = get_optional_env("SELLAPP_API_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "SELLAPP_API_TOKEN") {
                tracing::warn!("SELLAPP_API_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });

        Ok(Self {
            url,
            base_path: normalize_base_path(&get_env_or_default("SELLAPP_API_BASE_PATH", "")),
            service_token,
            timeout: get_duration_secs("SELLAPP_API_TIMEOUT_SECS", Duration::from_secs(30))?,
        })
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SELLAPP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SELLAPP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SELLAPP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SELLAPP_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SELLAPP_BASE_URL")?;
        let api = ApiConfig::from_env()?;
        let currency_symbol = get_env_or_default("SELLAPP_CURRENCY_SYMBOL", DEFAULT_CURRENCY_SYMBOL);
        let catalog_cache_ttl =
            get_duration_secs("SELLAPP_CATALOG_CACHE_SECS", Duration::from_secs(30))?;
        let poll = PollIntervals::from_env()?;
        let log_json = get_optional_env("SELLAPP_LOG_JSON").is_some();
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            base_url,
            api,
            currency_symbol,
            catalog_cache_ttl,
            poll,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Defaults for local development and tests, pointed at `api_url`.
    #[must_use]
    pub fn local(api_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api: ApiConfig {
                url: api_url,
                base_path: String::new(),
                service_token: None,
                timeout: Duration::from_secs(30),
            },
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            catalog_cache_ttl: Duration::from_secs(30),
            poll: PollIntervals::default(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a positive number of seconds.
fn get_duration_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// Ensure a non-empty base path starts with `/` and has no trailing `/`.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
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
            #[allow(clippy::cast_precision_loss)]
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_placeholder_tokens_rejected() {
        let err = validate_secret_strength("your-api-token-here", "SELLAPP_API_TOKEN").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaa", "SELLAPP_API_TOKEN").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "T").is_ok());
    }

    #[test]
    fn test_base_path_normalization() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("v1/"), "/v1");
        assert_eq!(normalize_base_path("/pos/api"), "/pos/api");
    }

    #[test]
    fn test_local_defaults() {
        let config = WebConfig::local(Url::parse("http://127.0.0.1:9000").unwrap());
        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(config.currency_symbol, "GH₵");
        assert_eq!(config.poll.alerts, Duration::from_secs(60));
        assert_eq!(config.poll.charts, Duration::from_secs(30));
        assert!(!config.is_secure());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let api = ApiConfig {
            url: Url::parse("https://pos.example.test").unwrap(),
            base_path: "/v1".to_string(),
            service_token: Some(SecretString::from("tok_9fK2mQ7xL1pZ")),
            timeout: Duration::from_secs(5),
        };
        let debug_output = format!("{api:?}");
        assert!(debug_output.contains("pos.example.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_9fK2mQ7xL1pZ"));
        assert_eq!(
            api.service_token.as_ref().map(|t| t.expose_secret().len()),
            Some(16)
        );
    }
}
