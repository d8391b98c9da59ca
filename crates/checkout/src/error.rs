//! Unified error type for the checkout crate.
//!
//! Validation failures are not errors: they live on the form as
//! [`ValidationError`](crate::ValidationError) values. Submission failures are
//! reported through [`SubmitOutcome`](crate::SubmitOutcome). What remains here
//! are programming and setup mistakes plus raw collaborator failures.

use thiserror::Error;

use crate::config::ConfigError;
use crate::form::FormError;
use crate::gateway::GatewayError;
use crate::reference::ReferenceDataError;

/// Application-level error type for the checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A form path did not name a group or field.
    #[error("Form error: {0}")]
    Form(#[from] FormError),

    /// A reference-data request failed.
    #[error("Reference data error: {0}")]
    ReferenceData(#[from] ReferenceDataError),

    /// The order gateway failed.
    #[error("Order gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// An HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;
