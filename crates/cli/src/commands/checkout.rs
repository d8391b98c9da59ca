//! Scripted checkout.
//!
//! Reads a JSON script describing what a customer would enter and drives the
//! checkout engine through the same steps a checkout page does: fill in the
//! customer, pick a country (which loads its states), pick a state, copy or
//! enter the billing address, pick a card year (which reloads the months),
//! and submit.
//!
//! See `fixtures/checkout.json` for a complete script.

use std::sync::Arc;

use serde::Deserialize;
use tillpoint_checkout::form::fields;
use tillpoint_checkout::http::HttpOrderGateway;
use tillpoint_checkout::{
    AddressGroup, CheckoutCollaborators, CheckoutEngine, FieldValue, GroupName, InMemoryCart,
    InMemoryOrderGateway, Navigator, OrderGateway, SubmitOutcome,
};
use tillpoint_core::CartLineItem;
use tracing::{info, warn};

use super::{CliError, Environment};

/// A complete checkout as a customer would enter it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutScript {
    pub cart: Vec<CartLineItem>,
    pub customer: CustomerScript,
    pub shipping_address: AddressScript,
    #[serde(default)]
    pub billing_same_as_shipping: bool,
    #[serde(default)]
    pub billing_address: Option<AddressScript>,
    pub credit_card: CardScript,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerScript {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// An address. `country` is a country code; `state` is a state code or name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressScript {
    pub street: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub zip_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardScript {
    pub card_type: String,
    pub name_on_card: String,
    pub card_number: String,
    pub security_code: String,
    #[serde(default)]
    pub expiration_month: Option<u32>,
    #[serde(default)]
    pub expiration_year: Option<i32>,
}

/// Navigator for a terminal: there is nowhere to go, so it reports the route.
#[derive(Debug, Default)]
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn go_to(&self, route: &str) {
        info!(route, "Checkout finished, continuing to route");
    }
}

/// Run the checkout script at `path` and print the outcome.
#[allow(clippy::print_stdout)]
pub async fn run(path: &str) -> Result<(), CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?;
    let script: CheckoutScript = serde_json::from_str(&content)?;

    let env = Environment::load()?;
    let gateway: Arc<dyn OrderGateway> = match &env.config.api {
        Some(api) => Arc::new(HttpOrderGateway::new(api)?),
        None => {
            warn!("CHECKOUT_API_BASE_URL not set, orders stay in memory");
            Arc::new(InMemoryOrderGateway::new())
        }
    };
    let collaborators = CheckoutCollaborators {
        reference_data: env.reference_data()?,
        cart: Arc::new(InMemoryCart::with_items(script.cart.clone())?),
        gateway,
        navigator: Arc::new(ConsoleNavigator),
        clock: Arc::clone(&env.clock),
    };

    let mut engine = CheckoutEngine::start(collaborators, env.config.engine_settings()).await;
    let totals = engine.totals();
    println!(
        "Cart: {} item(s), total {}",
        totals.total_quantity, totals.total_price
    );

    let outcome = script.drive(&mut engine).await?;
    if let Some(message) = outcome.message() {
        println!("{message}");
    }

    match outcome {
        SubmitOutcome::Placed { .. } => Ok(()),
        SubmitOutcome::Invalid { errors } => {
            for (path, errors) in &errors {
                let keys: Vec<_> = errors.iter().map(|e| e.key()).collect();
                println!("  {path}: {}", keys.join(", "));
            }
            Err(CliError::NotPlaced(format!("{} invalid field(s)", errors.len())))
        }
        SubmitOutcome::Failed { message } => Err(CliError::NotPlaced(message)),
    }
}

impl CheckoutScript {
    /// Enter the script into `engine` and submit.
    ///
    /// # Errors
    ///
    /// Returns error if a country or state in the script is not offered.
    pub async fn drive(&self, engine: &mut CheckoutEngine) -> Result<SubmitOutcome, CliError> {
        self.customer.enter(engine)?;
        self.shipping_address
            .enter(engine, AddressGroup::Shipping)
            .await?;

        if self.billing_same_as_shipping {
            engine.set_billing_same_as_shipping(true)?;
        } else if let Some(billing) = &self.billing_address {
            billing.enter(engine, AddressGroup::Billing).await?;
        }

        self.credit_card.enter(engine).await?;
        Ok(engine.submit().await)
    }
}

fn enter_text<'a>(
    engine: &mut CheckoutEngine,
    group: GroupName,
    values: impl IntoIterator<Item = (&'static str, &'a String)>,
) -> Result<(), CliError> {
    for (field, value) in values {
        engine.set_field_input(&group.path(field), FieldValue::text(value.as_str()))?;
    }
    Ok(())
}

impl CustomerScript {
    fn enter(&self, engine: &mut CheckoutEngine) -> Result<(), CliError> {
        enter_text(
            engine,
            GroupName::Customer,
            [
                (fields::FIRST_NAME, &self.first_name),
                (fields::LAST_NAME, &self.last_name),
                (fields::EMAIL, &self.email),
            ],
        )
    }
}

impl AddressScript {
    async fn enter(
        &self,
        engine: &mut CheckoutEngine,
        address: AddressGroup,
    ) -> Result<(), CliError> {
        let group = address.group_name();
        enter_text(
            engine,
            group,
            [
                (fields::STREET, &self.street),
                (fields::CITY, &self.city),
                (fields::ZIP_CODE, &self.zip_code),
            ],
        )?;

        let country = engine
            .reference_data()
            .countries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(&self.country))
            .cloned()
            .ok_or_else(|| CliError::UnknownCountry(self.country.clone()))?;
        engine.select_country(address, country).await?;

        // Without an explicit state the first one stays selected
        if let Some(wanted) = &self.state {
            let state = engine
                .reference_data()
                .states(address)
                .iter()
                .find(|s| s.code.eq_ignore_ascii_case(wanted) || s.name == *wanted)
                .cloned()
                .ok_or_else(|| CliError::UnknownState {
                    country: self.country.clone(),
                    state: wanted.clone(),
                })?;
            engine.set_field_input(&group.path(fields::STATE), state)?;
        }
        Ok(())
    }
}

impl CardScript {
    async fn enter(&self, engine: &mut CheckoutEngine) -> Result<(), CliError> {
        let group = GroupName::CreditCard;
        enter_text(
            engine,
            group,
            [
                (fields::CARD_TYPE, &self.card_type),
                (fields::NAME_ON_CARD, &self.name_on_card),
                (fields::CARD_NUMBER, &self.card_number),
                (fields::SECURITY_CODE, &self.security_code),
            ],
        )?;

        if let Some(year) = self.expiration_year {
            engine.select_expiration_year(year).await?;
        }
        if let Some(month) = self.expiration_month {
            if !engine.reference_data().card_months.contains(&month) {
                warn!(month, "Expiration month is not among the offered months");
            }
            engine.set_field_input(
                &group.path(fields::EXPIRATION_MONTH),
                FieldValue::Number(i64::from(month)),
            )?;
        }
        Ok(())
    }
}
