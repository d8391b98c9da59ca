//! CLI command implementations.

use std::sync::Arc;

use thiserror::Error;
use tillpoint_checkout::http::HttpReferenceData;
use tillpoint_checkout::{
    CartError, CheckoutConfig, CheckoutError, Clock, ConfigError, ReferenceDataError, ReferenceDataProvider,
    StaticReferenceData, SystemClock,
};

pub mod checkout;
pub mod reference;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Reference data unavailable: {0}")]
    ReferenceData(#[from] ReferenceDataError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid checkout script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("Invalid cart: {0}")]
    Cart(#[from] CartError),

    #[error("Unknown country code: {0}")]
    UnknownCountry(String),

    #[error("Unknown state {state} for country {country}")]
    UnknownState { country: String, state: String },

    #[error("Checkout did not complete: {0}")]
    NotPlaced(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Checkout(e.into())
    }
}

/// Configuration and shared services for one command invocation.
pub struct Environment {
    pub config: CheckoutConfig,
    pub clock: Arc<dyn Clock>,
}

impl Environment {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a configured variable is invalid.
    pub fn load() -> Result<Self, CliError> {
        Ok(Self {
            config: CheckoutConfig::from_env()?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Reference data from the backend if one is configured, else the
    /// built-in catalogue.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn reference_data(&self) -> Result<Arc<dyn ReferenceDataProvider>, CliError> {
        Ok(match &self.config.api {
            Some(api) => {
                tracing::debug!(base_url = %api.base_url, "Using backend reference data");
                Arc::new(HttpReferenceData::new(
                    api,
                    &self.config,
                    Arc::clone(&self.clock),
                )?)
            }
            None => Arc::new(
                StaticReferenceData::default_catalogue(Arc::clone(&self.clock))
                    .with_years_ahead(self.config.card_years_ahead),
            ),
        })
    }
}
