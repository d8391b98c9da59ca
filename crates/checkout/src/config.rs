//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CHECKOUT_API_BASE_URL` - Order backend base URL (e.g., `http://localhost:8080/api`).
//!   When unset, in-memory collaborators are used.
//! - `CHECKOUT_API_TOKEN` - Bearer token sent to the order backend
//! - `CHECKOUT_SUCCESS_ROUTE` - Route to navigate to after an order is placed (default: /products)
//! - `CHECKOUT_CARD_YEARS_AHEAD` - Card expiration years offered after the current one (default: 10)
//! - `CHECKOUT_REFERENCE_CACHE_TTL_SECS` - Countries/states cache TTL (default: 300)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::engine::EngineSettings;
use crate::reference::DEFAULT_CARD_YEARS_AHEAD;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
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

/// Checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Order backend configuration, if one is configured
    pub api: Option<ApiConfig>,
    /// Route to navigate to after an order is placed
    pub success_route: String,
    /// Card expiration years offered after the current one
    pub card_years_ahead: u16,
    /// TTL of cached countries and states
    pub reference_cache_ttl: Duration,
}

/// Order backend configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: Url,
    /// Bearer token
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api: None,
            success_route: EngineSettings::DEFAULT_SUCCESS_ROUTE.to_string(),
            card_years_ahead: DEFAULT_CARD_YEARS_AHEAD,
            reference_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api = lookup("CHECKOUT_API_BASE_URL")
            .map(|raw| ApiConfig::from_lookup(&raw, &lookup))
            .transpose()?;

        let success_route = lookup("CHECKOUT_SUCCESS_ROUTE").unwrap_or(defaults.success_route);
        if !success_route.starts_with('/') {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_SUCCESS_ROUTE".to_string(),
                "must start with '/'".to_string(),
            ));
        }

        let card_years_ahead = parse_or(
            "CHECKOUT_CARD_YEARS_AHEAD",
            &lookup,
            defaults.card_years_ahead,
        )?;
        let reference_cache_ttl = Duration::from_secs(parse_or(
            "CHECKOUT_REFERENCE_CACHE_TTL_SECS",
            &lookup,
            defaults.reference_cache_ttl.as_secs(),
        )?);

        Ok(Self {
            api,
            success_route,
            card_years_ahead,
            reference_cache_ttl,
        })
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            success_route: self.success_route.clone(),
        }
    }
}

impl ApiConfig {
    fn from_lookup(
        raw_url: &str,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // A trailing slash keeps `Url::join` from dropping the last path segment
        let normalized = if raw_url.ends_with('/') {
            raw_url.to_string()
        } else {
            format!("{raw_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_API_BASE_URL".to_string(), e.to_string())
        })?;

        let token = lookup("CHECKOUT_API_TOKEN")
            .map(|value| {
                validate_token(&value, "CHECKOUT_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;

        Ok(Self { base_url, token })
    }

    /// Value for the `Authorization` header, if a token is configured.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject tokens that are obviously placeholders.
fn validate_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "is empty".to_string(),
        ));
    }

    let lower = token.to_lowercase();
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CheckoutConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CheckoutConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.api.is_none());
        assert_eq!(config.success_route, "/products");
        assert_eq!(config.card_years_ahead, 10);
        assert_eq!(config.reference_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = load(&[("CHECKOUT_API_BASE_URL", "http://localhost:8080/api")]).unwrap();
        let api = config.api.unwrap();
        assert_eq!(api.base_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            api.base_url.join("countries").unwrap().as_str(),
            "http://localhost:8080/api/countries"
        );
        assert!(api.bearer().is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = load(&[("CHECKOUT_API_BASE_URL", "not a url")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CHECKOUT_API_BASE_URL"
        ));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let result = load(&[
            ("CHECKOUT_API_BASE_URL", "http://localhost:8080/api"),
            ("CHECKOUT_API_TOKEN", "your-token-here"),
        ]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let config = load(&[
            ("CHECKOUT_API_BASE_URL", "http://localhost:8080/api"),
            ("CHECKOUT_API_TOKEN", "k9Qe2LxZ"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("k9Qe2LxZ"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(
            config.api.unwrap().bearer().as_deref(),
            Some("Bearer k9Qe2LxZ")
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(load(&[("CHECKOUT_CARD_YEARS_AHEAD", "ten")]).is_err());
        assert!(load(&[("CHECKOUT_REFERENCE_CACHE_TTL_SECS", "-1")]).is_err());
        assert_eq!(
            load(&[("CHECKOUT_CARD_YEARS_AHEAD", "5")])
                .unwrap()
                .card_years_ahead,
            5
        );
    }

    #[test]
    fn test_success_route_must_be_absolute() {
        assert!(load(&[("CHECKOUT_SUCCESS_ROUTE", "products")]).is_err());
        assert_eq!(
            load(&[("CHECKOUT_SUCCESS_ROUTE", "/thank-you")])
                .unwrap()
                .success_route,
            "/thank-you"
        );
    }
}
