//! Reference data for checkout selection lists.
//!
//! Countries and states usually come from the order backend; card months and
//! years are derived from the calendar. [`StaticReferenceData`] serves all of
//! them from memory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tillpoint_core::{Country, State};

use crate::clock::Clock;

/// Default number of years after the current one offered for card expiry.
pub const DEFAULT_CARD_YEARS_AHEAD: u16 = 10;

/// Errors that can occur when fetching reference data.
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of the lists offered in checkout dropdowns.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    /// All countries that can be shipped to or billed in.
    async fn countries(&self) -> Result<Vec<Country>, ReferenceDataError>;

    /// States of the country with `country_code`. May be empty.
    async fn states(&self, country_code: &str) -> Result<Vec<State>, ReferenceDataError>;

    /// Expiration months from `start_month` through 12.
    async fn credit_card_months(&self, start_month: u32) -> Result<Vec<u32>, ReferenceDataError>;

    /// Expiration years from the current year onwards.
    async fn credit_card_years(&self) -> Result<Vec<i32>, ReferenceDataError>;
}

/// Months `start_month..=12`, with `start_month` clamped into 1..=12.
#[must_use]
pub fn card_months(start_month: u32) -> Vec<u32> {
    (start_month.clamp(1, 12)..=12).collect()
}

/// Years `current_year..=current_year + years_ahead`.
#[must_use]
pub fn card_years(current_year: i32, years_ahead: u16) -> Vec<i32> {
    (current_year..=current_year + i32::from(years_ahead)).collect()
}

/// In-memory reference data.
#[derive(Clone)]
pub struct StaticReferenceData {
    countries: Vec<Country>,
    states: HashMap<String, Vec<State>>,
    clock: Arc<dyn Clock>,
    years_ahead: u16,
}

impl StaticReferenceData {
    /// Create an empty catalogue.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            countries: Vec::new(),
            states: HashMap::new(),
            clock,
            years_ahead: DEFAULT_CARD_YEARS_AHEAD,
        }
    }

    /// Add a country and its states. Later calls replace earlier states.
    #[must_use]
    pub fn with_country(mut self, country: Country, states: Vec<State>) -> Self {
        self.states.insert(country.code.clone(), states);
        self.countries.retain(|c| c.code != country.code);
        self.countries.push(country);
        self
    }

    /// Set how many years after the current one are offered.
    #[must_use]
    pub const fn with_years_ahead(mut self, years_ahead: u16) -> Self {
        self.years_ahead = years_ahead;
        self
    }

    /// The built-in catalogue of countries and states.
    #[must_use]
    pub fn default_catalogue(clock: Arc<dyn Clock>) -> Self {
        let states = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(code, name)| State::new(*code, *name))
                .collect::<Vec<_>>()
        };

        Self::new(clock)
            .with_country(
                Country::new("BR", "Brazil"),
                states(&[
                    ("AC", "Acre"),
                    ("BA", "Bahia"),
                    ("RJ", "Rio de Janeiro"),
                    ("SP", "São Paulo"),
                ]),
            )
            .with_country(
                Country::new("CA", "Canada"),
                states(&[
                    ("AB", "Alberta"),
                    ("BC", "British Columbia"),
                    ("ON", "Ontario"),
                    ("QC", "Québec"),
                ]),
            )
            .with_country(
                Country::new("DE", "Germany"),
                states(&[("BE", "Berlin"), ("BY", "Bayern"), ("HH", "Hamburg")]),
            )
            .with_country(
                Country::new("IN", "India"),
                states(&[
                    ("DL", "Delhi"),
                    ("KA", "Karnataka"),
                    ("MH", "Maharashtra"),
                ]),
            )
            .with_country(
                Country::new("TR", "Turkey"),
                states(&[("06", "Ankara"), ("34", "İstanbul"), ("35", "İzmir")]),
            )
            .with_country(
                Country::new("US", "United States"),
                states(&[
                    ("CA", "California"),
                    ("NY", "New York"),
                    ("TX", "Texas"),
                    ("WA", "Washington"),
                ]),
            )
    }
}

impl std::fmt::Debug for StaticReferenceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticReferenceData")
            .field("countries", &self.countries.len())
            .field("years_ahead", &self.years_ahead)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReferenceDataProvider for StaticReferenceData {
    async fn countries(&self) -> Result<Vec<Country>, ReferenceDataError> {
        Ok(self.countries.clone())
    }

    async fn states(&self, country_code: &str) -> Result<Vec<State>, ReferenceDataError> {
        Ok(self.states.get(country_code).cloned().unwrap_or_default())
    }

    async fn credit_card_months(&self, start_month: u32) -> Result<Vec<u32>, ReferenceDataError> {
        Ok(card_months(start_month))
    }

    async fn credit_card_years(&self) -> Result<Vec<i32>, ReferenceDataError> {
        Ok(card_years(self.clock.current_year(), self.years_ahead))
    }
}
