//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GREENSHOES_API_URL` - Base URL of the storefront REST API
//!   (e.g., `https://api.greenshoes.shop/api`)
//!
//! ## Optional
//! - `GREENSHOES_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `GREENSHOES_CATALOG_CACHE_SECS` - Product cache TTL (default: 300)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_CACHE_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all API paths are appended to
    pub api_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration for `api_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL cannot be parsed or is
    /// not http(s).
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("GREENSHOES_API_URL", api_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS),
        })
    }

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

        let api_url = get_required_env("GREENSHOES_API_URL")?;
        let timeout = get_secs_or_default("GREENSHOES_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let catalog_cache_ttl =
            get_secs_or_default("GREENSHOES_CATALOG_CACHE_SECS", DEFAULT_CATALOG_CACHE_SECS)?;

        Ok(Self {
            api_url: parse_api_url("GREENSHOES_API_URL", &api_url)?,
            timeout,
            catalog_cache_ttl,
        })
    }

    /// Base URL without a trailing slash, ready for `/path` suffixes.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a duration in whole seconds, falling back to `default`.
fn get_secs_or_default(key: &str, default: u64) -> Result<Duration, ConfigError> {
    std::env::var(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = ClientConfig::new("http://localhost:4000/api/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:4000/api");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://api.greenshoes.shop").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(ClientConfig::new("not a url").is_err());
    }
}
