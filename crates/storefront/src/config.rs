//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REMOTE_STORE_URL` - Base URL of the hosted backend (data + auth)
//! - `REMOTE_STORE_KEY` - Publishable API key for the hosted backend
//! - `PAYMENT_KEY_ID` - Public key id for the payment redirect widget
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYMENT_CURRENCY` - ISO currency code for payments (default: INR)
//! - `POSTAL_LOOKUP_URL` - Postal code lookup endpoint
//!   (default: <https://api.postalpincode.in/pincode>)
//! - `DELIVERY_FEE` - Flat delivery fee added to every order (default: 50)

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Hosted backend configuration
    pub remote: RemoteStoreConfig,
    /// Payment redirect widget configuration
    pub payment: PaymentConfig,
    /// Postal code lookup endpoint
    pub postal_lookup_url: String,
    /// Flat delivery fee added to every order total
    pub delivery_fee: Decimal,
}

/// Hosted backend (data + auth) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct RemoteStoreConfig {
    /// Base URL of the hosted backend
    pub endpoint: Url,
    /// Publishable API key, sent with every request
    pub publishable_key: SecretString,
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("publishable_key", &"[REDACTED]")
            .finish()
    }
}

/// Payment redirect widget configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Public key id handed to the external widget
    pub key_id: String,
    /// ISO 4217 currency code for charges
    pub currency: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let remote = RemoteStoreConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;

        let postal_lookup_url = get_env_or_default(
            "POSTAL_LOOKUP_URL",
            "https://api.postalpincode.in/pincode",
        );
        let delivery_fee = get_env_or_default("DELIVERY_FEE", "50")
            .parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar("DELIVERY_FEE".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            remote,
            payment,
            postal_lookup_url,
            delivery_fee,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RemoteStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_required_env("REMOTE_STORE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("REMOTE_STORE_URL".to_string(), e.to_string())
            })?;
        let publishable_key = get_checked_key("REMOTE_STORE_KEY")?;

        Ok(Self {
            endpoint,
            publishable_key,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            key_id: get_required_env("PAYMENT_KEY_ID")?,
            currency: get_env_or_default("PAYMENT_CURRENCY", "INR"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reject API keys that are obviously copied from documentation.
fn check_not_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Load a key from the environment and validate it.
fn get_checked_key(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_not_placeholder(&value, key)?;
    Ok(SecretString::from(value))
}
