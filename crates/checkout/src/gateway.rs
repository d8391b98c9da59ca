//! Order placement and post-checkout navigation ports.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tillpoint_core::{OrderSubmission, PurchaseResponse, TrackingNumber};
use tracing::info;
use uuid::Uuid;

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The backend refused the order.
    #[error("{0}")]
    Rejected(String),
}

impl GatewayError {
    /// Text for the customer: the backend's own message when it sent one.
    #[must_use]
    pub fn customer_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Rejected(message) => message.clone(),
            Self::Http(_) | Self::Parse(_) => self.to_string(),
        }
    }
}

/// Sends assembled orders to the order backend.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place an order. Called once per submission; never retried.
    async fn place_order(
        &self,
        submission: &OrderSubmission,
    ) -> Result<PurchaseResponse, GatewayError>;
}

/// Leaves the checkout once an order is placed.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`. Fire-and-forget.
    fn go_to(&self, route: &str);
}

/// A gateway that accepts orders in memory.
///
/// Every accepted order gets a fresh UUID v4 tracking number. The gateway can
/// be switched to reject every order with a fixed message.
#[derive(Debug, Default)]
pub struct InMemoryOrderGateway {
    placed: Mutex<Vec<(TrackingNumber, OrderSubmission)>>,
    attempts: Mutex<usize>,
    failure: Mutex<Option<String>>,
}

impl InMemoryOrderGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that rejects every order with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let gateway = Self::new();
        gateway.fail_with(Some(message.into()));
        gateway
    }

    /// Reject subsequent orders with `message`, or accept them again with `None`.
    pub fn fail_with(&self, message: Option<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    /// Orders accepted so far, oldest first.
    #[must_use]
    pub fn placed(&self) -> Vec<(TrackingNumber, OrderSubmission)> {
        self.placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `place_order` calls, accepted or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderGateway {
    async fn place_order(
        &self,
        submission: &OrderSubmission,
    ) -> Result<PurchaseResponse, GatewayError> {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if let Some(message) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(GatewayError::Rejected(message));
        }

        let tracking_number = TrackingNumber::new(Uuid::new_v4().to_string());
        info!(%tracking_number, items = submission.order_items.len(), "Order accepted");
        self.placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((tracking_number.clone(), submission.clone()));

        Ok(PurchaseResponse {
            order_tracking_number: tracking_number,
        })
    }
}

/// A navigator that records the routes it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes navigated to, oldest first.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: &str) {
        info!(route, "Navigating");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
