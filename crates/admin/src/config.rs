//! Back-office configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFLOOR_BASE_URL` - Public URL for the back office
//! - `BACKEND_API_URL` - Base URL of the remote REST API
//! - `BACKEND_API_TOKEN` - Bearer token for the remote REST API
//!
//! ## Optional
//! - `SHOPFLOOR_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFLOOR_PORT` - Listen port (default: 3001)
//! - `BACKEND_API_TIMEOUT_SECS` - Remote request timeout (default: 15)
//! - `CATEGORY_CACHE_TTL_SECS` - Category list cache lifetime (default: 300)
//! - `POS_PAGE_SIZE` - Products per catalog page (default: 24)
//! - `CLIENT_PAGE_SIZE` - Clients per picker page (default: 10)
//! - `POS_CURRENCY` - ISO 4217 code used to display prices (default: USD)
//! - `PHOTO_MAX_UPLOAD_BYTES` - Largest accepted photo upload (default: 5 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `SHOPFLOOR_TLS_CERT` - PEM-encoded certificate chain
//! - `SHOPFLOOR_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use shopfloor_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_PHOTO_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Back-office application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the back office
    pub base_url: String,
    /// Remote REST API configuration
    pub api: ApiConfig,
    /// POS screen settings
    pub pos: PosConfig,
    /// Photo gallery settings
    pub photos: PhotoConfig,
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

/// Remote REST API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/v1/`
    pub base_url: Url,
    /// Bearer token sent with every request
    pub token: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long the category list stays cached
    pub category_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("category_cache_ttl", &self.category_cache_ttl)
            .finish()
    }
}

/// POS screen settings.
#[derive(Debug, Clone, Copy)]
pub struct PosConfig {
    /// Products fetched per catalog page
    pub page_size: u32,
    /// Clients fetched per picker page
    pub client_page_size: u32,
    /// Currency used when displaying prices
    pub currency: CurrencyCode,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self {
            page_size: 24,
            client_page_size: 10,
            currency: CurrencyCode::USD,
        }
    }
}

/// Photo gallery settings.
#[derive(Debug, Clone, Copy)]
pub struct PhotoConfig {
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_PHOTO_MAX_UPLOAD_BYTES,
        }
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
        let cert_pem = get_optional_env("SHOPFLOOR_TLS_CERT");
        let key_pem = get_optional_env("SHOPFLOOR_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPFLOOR_TLS_*".to_string(),
                "Both SHOPFLOOR_TLS_CERT and SHOPFLOOR_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SHOPFLOOR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPFLOOR_HOST".to_string(), e.to_string()))?;
        let port = parse_env("SHOPFLOOR_PORT", 3001_u16)?;
        let base_url = get_required_env("SHOPFLOOR_BASE_URL")?;

        let api = ApiConfig::from_env()?;
        let pos = PosConfig::from_env()?;
        let photos = PhotoConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            api,
            pos,
            photos,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the back office is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("BACKEND_API_URL")?;
        let base_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e))?;

        Ok(Self {
            base_url,
            token: get_validated_secret("BACKEND_API_TOKEN")?,
            timeout: Duration::from_secs(parse_env("BACKEND_API_TIMEOUT_SECS", 15_u64)?),
            category_cache_ttl: Duration::from_secs(parse_env("CATEGORY_CACHE_TTL_SECS", 300_u64)?),
        })
    }
}

impl PosConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let currency = get_env_or_default("POS_CURRENCY", defaults.currency.code())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("POS_CURRENCY".to_string(), e.to_string()))?;

        Ok(Self {
            page_size: parse_nonzero("POS_PAGE_SIZE", defaults.page_size)?,
            client_page_size: parse_nonzero("CLIENT_PAGE_SIZE", defaults.client_page_size)?,
            currency,
        })
    }
}

impl PhotoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_upload_bytes: parse_env("PHOTO_MAX_UPLOAD_BYTES", DEFAULT_PHOTO_MAX_UPLOAD_BYTES)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// any path prefix (`/v1/` + `products` = `/v1/products`).
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse an optional page size that must be at least 1.
fn parse_nonzero(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = parse_env(key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            api: ApiConfig {
                base_url: parse_base_url("http://localhost:9000/api").unwrap(),
                token: SecretString::from("tok_live_9f8e7d6c5b4a"),
                timeout: Duration::from_secs(15),
                category_cache_ttl: Duration::from_secs(300),
            },
            pos: PosConfig::default(),
            photos: PhotoConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-token-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            url.join("products").unwrap().as_str(),
            "https://api.example.com/v1/products"
        );

        let url = parse_base_url("https://api.example.com").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = test_config();
        let debug_output = format!("{:?}", config.api);

        assert!(debug_output.contains("localhost:9000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_live_9f8e7d6c5b4a"));
    }

    #[test]
    fn test_pos_config_defaults() {
        let pos = PosConfig::default();
        assert_eq!(pos.page_size, 24);
        assert_eq!(pos.client_page_size, 10);
        assert_eq!(pos.currency, CurrencyCode::USD);
    }
}
