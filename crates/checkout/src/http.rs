//! HTTP collaborators backed by the order backend's REST API.
//!
//! # Endpoints
//!
//! All paths are relative to `CHECKOUT_API_BASE_URL`:
//!
//! - `GET countries` - `{"_embedded": {"countries": [{"code", "name"}, ...]}}`
//! - `GET states/search/findByCountryCode?code=XX` - `{"_embedded": {"states": [...]}}`
//! - `POST checkout/purchase` - body is an [`OrderSubmission`], response is
//!   `{"orderTrackingNumber": "..."}`
//!
//! Countries and states are cached in memory via `moka`. Card months and
//! years never hit the network; they are derived from the calendar.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tillpoint_core::{Country, OrderSubmission, PurchaseResponse, State};
use tracing::{debug, instrument};
use url::Url;

use crate::clock::Clock;
use crate::config::{ApiConfig, CheckoutConfig, ConfigError};
use crate::error::Result;
use crate::gateway::{GatewayError, OrderGateway};
use crate::reference::{ReferenceDataError, ReferenceDataProvider, card_months, card_years};

/// Maximum number of cached reference lists.
const CACHE_CAPACITY: u64 = 512;

/// Cache key for reference lists.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Countries,
    States(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Countries(Vec<Country>),
    States(Vec<State>),
}

/// Spring Data REST collection envelope.
#[derive(Debug, Deserialize)]
struct Embedded<T> {
    #[serde(rename = "_embedded")]
    embedded: T,
}

#[derive(Debug, Deserialize)]
struct CountryList {
    countries: Vec<Country>,
}

#[derive(Debug, Deserialize)]
struct StateList {
    states: Vec<State>,
}

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build a client that sends the bearer token, if any, with every request.
fn build_client(api: &ApiConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    if let Some(bearer) = api.bearer() {
        let value = HeaderValue::from_str(&bearer).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_API_TOKEN".to_string(), e.to_string())
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Pull a human-readable message out of an error response body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body).map_or(body, |parsed| parsed.message)
}

fn countries_url(base: &Url) -> std::result::Result<Url, url::ParseError> {
    base.join("countries")
}

fn states_url(base: &Url, country_code: &str) -> std::result::Result<Url, url::ParseError> {
    let mut url = base.join("states/search/findByCountryCode")?;
    url.query_pairs_mut().append_pair("code", country_code);
    Ok(url)
}

fn purchase_url(base: &Url) -> std::result::Result<Url, url::ParseError> {
    base.join("checkout/purchase")
}

/// Reference data served by the order backend.
#[derive(Clone)]
pub struct HttpReferenceData {
    client: reqwest::Client,
    base_url: Url,
    clock: Arc<dyn Clock>,
    years_ahead: u16,
    cache: Cache<CacheKey, CacheValue>,
}

impl HttpReferenceData {
    /// Create a provider for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api: &ApiConfig, config: &CheckoutConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.reference_cache_ttl)
            .build();

        Ok(Self {
            client: build_client(api)?,
            base_url: api.base_url.clone(),
            clock,
            years_ahead: config.card_years_ahead,
            cache,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> std::result::Result<T, ReferenceDataError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReferenceDataError::Api {
                status: status.as_u16(),
                message: error_message(message),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ReferenceDataError::Parse(e.to_string()))
    }
}

impl std::fmt::Debug for HttpReferenceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReferenceData")
            .field("base_url", &self.base_url.as_str())
            .field("years_ahead", &self.years_ahead)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReferenceDataProvider for HttpReferenceData {
    #[instrument(skip(self))]
    async fn countries(&self) -> std::result::Result<Vec<Country>, ReferenceDataError> {
        if let Some(CacheValue::Countries(countries)) = self.cache.get(&CacheKey::Countries).await
        {
            debug!("Countries served from cache");
            return Ok(countries);
        }

        let url = countries_url(&self.base_url)
            .map_err(|e| ReferenceDataError::Parse(e.to_string()))?;
        let page: Embedded<CountryList> = self.get_json(url).await?;
        let countries = page.embedded.countries;

        self.cache
            .insert(CacheKey::Countries, CacheValue::Countries(countries.clone()))
            .await;
        Ok(countries)
    }

    #[instrument(skip(self))]
    async fn states(&self, country_code: &str) -> std::result::Result<Vec<State>, ReferenceDataError> {
        let key = CacheKey::States(country_code.to_string());
        if let Some(CacheValue::States(states)) = self.cache.get(&key).await {
            debug!("States served from cache");
            return Ok(states);
        }

        let url = states_url(&self.base_url, country_code)
            .map_err(|e| ReferenceDataError::Parse(e.to_string()))?;
        let page: Embedded<StateList> = self.get_json(url).await?;
        let states = page.embedded.states;

        self.cache
            .insert(key, CacheValue::States(states.clone()))
            .await;
        Ok(states)
    }

    async fn credit_card_months(
        &self,
        start_month: u32,
    ) -> std::result::Result<Vec<u32>, ReferenceDataError> {
        Ok(card_months(start_month))
    }

    async fn credit_card_years(&self) -> std::result::Result<Vec<i32>, ReferenceDataError> {
        Ok(card_years(self.clock.current_year(), self.years_ahead))
    }
}

/// Order gateway posting to the backend's purchase endpoint.
#[derive(Clone)]
pub struct HttpOrderGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpOrderGateway {
    /// Create a gateway for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(api)?,
            base_url: api.base_url.clone(),
        })
    }
}

impl std::fmt::Debug for HttpOrderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOrderGateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    #[instrument(skip(self, submission), fields(items = submission.order_items.len()))]
    async fn place_order(
        &self,
        submission: &OrderSubmission,
    ) -> std::result::Result<PurchaseResponse, GatewayError> {
        let url = purchase_url(&self.base_url).map_err(|e| GatewayError::Parse(e.to_string()))?;

        let response = self.client.post(url).json(submission).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: error_message(message),
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tillpoint_core::{CartLineItem, CartTotals};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::clock::FixedClock;
    use crate::form::CheckoutForm;
    use crate::submission;

    const COUNTRIES: &str =
        r#"{"_embedded": {"countries": [{"code": "CA", "name": "Canada"}]}}"#;
    const STATES: &str = r#"{"_embedded": {"states": [{"code": "ON", "name": "Ontario"}]}}"#;

    /// A local backend answering every connection with the same response.
    struct CannedBackend {
        base_url: String,
        connections: Arc<AtomicUsize>,
    }

    impl CannedBackend {
        async fn serve(status: u16, body: &'static str) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let connections = Arc::new(AtomicUsize::new(0));
            let accepted = Arc::clone(&connections);

            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(respond(stream, status, body));
                }
            });

            Self {
                base_url: format!("http://{addr}/api"),
                connections,
            }
        }

        fn connections(&self) -> usize {
            self.connections.load(Ordering::SeqCst)
        }

        fn config(&self) -> CheckoutConfig {
            let base_url = self.base_url.clone();
            CheckoutConfig::from_lookup(move |key| {
                (key == "CHECKOUT_API_BASE_URL").then(|| base_url.clone())
            })
            .unwrap()
        }

        fn reference_data(&self) -> HttpReferenceData {
            let config = self.config();
            let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(2026, 10).unwrap());
            HttpReferenceData::new(config.api.as_ref().unwrap(), &config, clock).unwrap()
        }

        fn gateway(&self) -> HttpOrderGateway {
            HttpOrderGateway::new(self.config().api.as_ref().unwrap()).unwrap()
        }
    }

    /// Read one full request, answer it, and close the connection.
    async fn respond(mut stream: TcpStream, status: u16, body: &'static str) {
        let mut request = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !request_complete(&request) {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&chunk[..n]),
            }
        }

        let response = format!(
            "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..end]);
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() - (end + 4) >= length
    }

    fn order() -> OrderSubmission {
        let items = [CartLineItem::new("P1", rust_decimal::Decimal::ONE, 1)];
        let totals = CartTotals::from_items(&items).unwrap();
        submission::assemble(&CheckoutForm::initialize(), totals, &items)
    }

    fn base() -> Url {
        Url::parse("http://localhost:8080/api/").unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            countries_url(&base()).unwrap().as_str(),
            "http://localhost:8080/api/countries"
        );
        assert_eq!(
            states_url(&base(), "CA").unwrap().as_str(),
            "http://localhost:8080/api/states/search/findByCountryCode?code=CA"
        );
        assert_eq!(
            purchase_url(&base()).unwrap().as_str(),
            "http://localhost:8080/api/checkout/purchase"
        );
    }

    #[test]
    fn test_state_code_is_encoded() {
        let url = states_url(&base(), "A B&C").unwrap();
        assert_eq!(url.query(), Some("code=A+B%26C"));
    }

    #[test]
    fn test_parse_embedded_countries() {
        let body = r#"{"_embedded": {"countries": [
            {"id": 1, "code": "BR", "name": "Brazil"},
            {"id": 2, "code": "CA", "name": "Canada"}
        ]}, "_links": {}}"#;
        let page: Embedded<CountryList> = serde_json::from_str(body).unwrap();
        assert_eq!(page.embedded.countries.len(), 2);
        assert_eq!(page.embedded.countries[1], Country::new("CA", "Canada"));
    }

    #[test]
    fn test_parse_embedded_states_without_codes() {
        let body = r#"{"_embedded": {"states": [{"id": 1, "name": "Alberta"}]}}"#;
        let page: Embedded<StateList> = serde_json::from_str(body).unwrap();
        assert_eq!(page.embedded.states[0].name, "Alberta");
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"status": 500, "message": "Card declined"}"#.to_string()),
            "Card declined"
        );
        assert_eq!(error_message("Bad Gateway".to_string()), "Bad Gateway");
    }

    #[test]
    fn test_gateway_builds_with_token() {
        let config = CheckoutConfig::from_lookup(|key| match key {
            "CHECKOUT_API_BASE_URL" => Some("http://localhost:8080/api".to_string()),
            "CHECKOUT_API_TOKEN" => Some("k9Qe2LxZ".to_string()),
            _ => None,
        })
        .unwrap();
        let api = config.api.unwrap();
        assert!(HttpOrderGateway::new(&api).is_ok());
    }

    // =========================================================================
    // Against a local backend
    // =========================================================================

    #[tokio::test]
    async fn test_countries_served_from_cache_after_first_request() {
        let backend = CannedBackend::serve(200, COUNTRIES).await;
        let provider = backend.reference_data();

        let first = provider.countries().await.unwrap();
        let second = provider.countries().await.unwrap();

        assert_eq!(first, vec![Country::new("CA", "Canada")]);
        assert_eq!(second, first);
        assert_eq!(backend.connections(), 1);
    }

    #[tokio::test]
    async fn test_states_cached_per_country() {
        let backend = CannedBackend::serve(200, STATES).await;
        let provider = backend.reference_data();

        provider.states("CA").await.unwrap();
        provider.states("CA").await.unwrap();
        assert_eq!(backend.connections(), 1);

        let states = provider.states("US").await.unwrap();
        assert_eq!(states, vec![State::new("ON", "Ontario")]);
        assert_eq!(backend.connections(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_not_cached() {
        let backend =
            CannedBackend::serve(503, r#"{"status": 503, "message": "Down for maintenance"}"#)
                .await;
        let provider = backend.reference_data();

        let result = provider.countries().await;
        assert!(matches!(
            result,
            Err(ReferenceDataError::Api { status: 503, ref message }) if message == "Down for maintenance"
        ));

        assert!(provider.countries().await.is_err());
        assert_eq!(backend.connections(), 2);
    }

    #[tokio::test]
    async fn test_malformed_states_body() {
        let backend = CannedBackend::serve(200, r#"{"_embedded": {"states": "#).await;
        let provider = backend.reference_data();

        let result = provider.states("CA").await;

        assert!(matches!(result, Err(ReferenceDataError::Parse(_))));
    }

    #[tokio::test]
    async fn test_purchase_returns_tracking_number() {
        let backend =
            CannedBackend::serve(200, r#"{"orderTrackingNumber": "5e1d-8a2f"}"#).await;

        let response = backend.gateway().place_order(&order()).await.unwrap();

        assert_eq!(response.order_tracking_number.as_str(), "5e1d-8a2f");
        assert_eq!(backend.connections(), 1);
    }

    #[tokio::test]
    async fn test_purchase_rejection_keeps_backend_message() {
        let backend =
            CannedBackend::serve(422, r#"{"status": 422, "message": "Card declined"}"#).await;

        let error = backend.gateway().place_order(&order()).await.unwrap_err();

        assert!(matches!(error, GatewayError::Api { status: 422, .. }));
        assert_eq!(error.customer_message(), "Card declined");
        assert_eq!(error.to_string(), "API error: 422 - Card declined");
    }

    #[tokio::test]
    async fn test_purchase_with_unreadable_response() {
        let backend = CannedBackend::serve(200, "<html>Gateway Timeout</html>").await;

        let error = backend.gateway().place_order(&order()).await.unwrap_err();

        assert!(matches!(error, GatewayError::Parse(_)));
    }
}
