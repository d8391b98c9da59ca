//! Integration tests for Tillpoint checkout.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tillpoint-integration-tests
//! ```
//!
//! Every test runs the checkout engine against in-memory collaborators with a
//! fixed clock (October 2026). No network or database is involved.
//!
//! # Test Categories
//!
//! - `checkout_flow` - submission gating, order placement, failure handling
//! - `reference_cascade` - state lists, billing copy, card months and years

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tillpoint_checkout::{
    AddressGroup, CheckoutCollaborators, CheckoutEngine, Clock, EngineSettings, FieldValue,
    FixedClock, InMemoryCart, InMemoryOrderGateway, RecordingNavigator, ReferenceDataError,
    ReferenceDataProvider, StaticReferenceData,
};
use tillpoint_core::{CartLineItem, Country, State};

/// Year of the fixed test clock.
pub const CURRENT_YEAR: i32 = 2026;
/// Month of the fixed test clock.
pub const CURRENT_MONTH: u32 = 10;

/// The fixed test clock.
#[must_use]
pub fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(CURRENT_YEAR, CURRENT_MONTH).unwrap())
}

#[must_use]
pub fn canada() -> Country {
    Country::new("CA", "Canada")
}

#[must_use]
pub fn united_states() -> Country {
    Country::new("US", "United States")
}

/// A catalogue with a country that has no states.
#[must_use]
pub fn catalogue() -> StaticReferenceData {
    StaticReferenceData::new(clock())
        .with_country(
            canada(),
            vec![State::new("ON", "Ontario"), State::new("QC", "Québec")],
        )
        .with_country(
            united_states(),
            vec![State::new("NY", "New York"), State::new("TX", "Texas")],
        )
        .with_country(Country::new("AQ", "Antarctica"), Vec::new())
}

/// Reference data that can be switched offline mid-test.
///
/// While offline, every request fails; the request log keeps growing.
pub struct SwitchableReferenceData {
    inner: StaticReferenceData,
    offline: Mutex<bool>,
    requests: Mutex<Vec<String>>,
}

impl SwitchableReferenceData {
    #[must_use]
    pub fn new(inner: StaticReferenceData) -> Self {
        Self {
            inner,
            offline: Mutex::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap_or_else(PoisonError::into_inner) = offline;
    }

    /// Requests seen so far, e.g. `"states:CA"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, request: String) -> Result<(), ReferenceDataError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if *self.offline.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(ReferenceDataError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceDataProvider for SwitchableReferenceData {
    async fn countries(&self) -> Result<Vec<Country>, ReferenceDataError> {
        self.record("countries".to_string())?;
        self.inner.countries().await
    }

    async fn states(&self, country_code: &str) -> Result<Vec<State>, ReferenceDataError> {
        self.record(format!("states:{country_code}"))?;
        self.inner.states(country_code).await
    }

    async fn credit_card_months(&self, start_month: u32) -> Result<Vec<u32>, ReferenceDataError> {
        self.record(format!("months:{start_month}"))?;
        self.inner.credit_card_months(start_month).await
    }

    async fn credit_card_years(&self) -> Result<Vec<i32>, ReferenceDataError> {
        self.record("years".to_string())?;
        self.inner.credit_card_years().await
    }
}

/// A running checkout plus handles on its in-memory collaborators.
pub struct TestContext {
    pub engine: CheckoutEngine,
    pub reference_data: Arc<SwitchableReferenceData>,
    pub cart: Arc<InMemoryCart>,
    pub gateway: Arc<InMemoryOrderGateway>,
    pub navigator: Arc<RecordingNavigator>,
}

impl TestContext {
    /// Start a checkout over a cart holding two units of `P1` at 29.99.
    pub async fn new() -> Self {
        Self::with_gateway(InMemoryOrderGateway::new()).await
    }

    pub async fn with_gateway(gateway: InMemoryOrderGateway) -> Self {
        let reference_data = Arc::new(SwitchableReferenceData::new(catalogue()));
        let cart = Arc::new(
            InMemoryCart::with_items([CartLineItem::new("P1", dec!(29.99), 2)]).unwrap(),
        );
        let gateway = Arc::new(gateway);
        let navigator = Arc::new(RecordingNavigator::new());

        let engine = CheckoutEngine::start(
            CheckoutCollaborators {
                reference_data: reference_data.clone(),
                cart: cart.clone(),
                gateway: gateway.clone(),
                navigator: navigator.clone(),
                clock: clock(),
            },
            EngineSettings::default(),
        )
        .await;

        Self {
            engine,
            reference_data,
            cart,
            gateway,
            navigator,
        }
    }

    /// Fill every field with valid data: Canada/Ontario shipping, billing
    /// copied from shipping, a Visa expiring next year.
    pub async fn fill_valid(&mut self) {
        for (path, value) in [
            ("customer.firstName", "Ada"),
            ("customer.lastName", "Lovelace"),
            ("customer.email", "ada@example.com"),
            ("shippingAddress.street", "100 Queen St W"),
            ("shippingAddress.city", "Toronto"),
            ("shippingAddress.zipCode", "M5H 2N2"),
            ("creditCard.cardType", "Visa"),
            ("creditCard.nameOnCard", "Ada Lovelace"),
            ("creditCard.cardNumber", "4111111111111111"),
            ("creditCard.securityCode", "123"),
        ] {
            self.engine
                .set_field_input(path, FieldValue::text(value))
                .unwrap();
        }
        self.engine
            .select_country(AddressGroup::Shipping, canada())
            .await
            .unwrap();
        self.engine.set_billing_same_as_shipping(true).unwrap();
        self.engine
            .select_expiration_year(CURRENT_YEAR + 1)
            .await
            .unwrap();
        self.engine
            .set_field_input("creditCard.expirationMonth", FieldValue::Number(3))
            .unwrap();
    }
}
