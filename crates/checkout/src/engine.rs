//! The checkout workflow engine.
//!
//! The engine owns the [`CheckoutForm`] and the reference lists shown next to
//! it, and orchestrates everything that happens between opening the checkout
//! and leaving it:
//!
//! 1. On [`CheckoutEngine::start`] it subscribes to cart totals, builds an
//!    empty form, and loads countries plus card months and years.
//! 2. Selecting a country reloads that address group's state list and
//!    pre-selects its first entry; selecting an expiration year reloads the
//!    month list.
//! 3. [`CheckoutEngine::set_billing_same_as_shipping`] copies the shipping
//!    address, and its state list, into billing once.
//! 4. [`CheckoutEngine::submit`] gates on form validity, assembles the order,
//!    places it, and on success clears cart and form and navigates away.
//!
//! Requests are not fire-and-forget. [`CheckoutEngine::start`],
//! [`CheckoutEngine::select_country`] and
//! [`CheckoutEngine::select_expiration_year`] await their provider requests
//! and apply the results before returning. Every operation takes `&mut self`,
//! so operations on one engine never overlap and their results land in the
//! order the operations were called.
//!
//! Reference-data failures are logged and leave the affected list as it was.
//! Submission failures come back as [`SubmitOutcome::Failed`]; nothing is
//! retried.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tillpoint_core::{CartTotals, Country, OrderSubmission, State, TrackingNumber};
use tracing::{debug, error, info, instrument, warn};

use crate::cart::{CartSnapshotSource, CartSubscription};
use crate::clock::Clock;
use crate::error::Result;
use crate::form::{CheckoutForm, FieldValue, GroupName, fields};
use crate::gateway::{Navigator, OrderGateway};
use crate::reference::ReferenceDataProvider;
use crate::submission;
use crate::validators::ValidationError;

/// The two address groups, each with its own state list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressGroup {
    Shipping,
    Billing,
}

impl AddressGroup {
    /// The form group holding this address.
    #[must_use]
    pub const fn group_name(self) -> GroupName {
        match self {
            Self::Shipping => GroupName::ShippingAddress,
            Self::Billing => GroupName::BillingAddress,
        }
    }
}

impl fmt::Display for AddressGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name().as_str())
    }
}

impl TryFrom<GroupName> for AddressGroup {
    type Error = GroupName;

    fn try_from(group: GroupName) -> std::result::Result<Self, Self::Error> {
        match group {
            GroupName::ShippingAddress => Ok(Self::Shipping),
            GroupName::BillingAddress => Ok(Self::Billing),
            other => Err(other),
        }
    }
}

/// Reference lists currently offered by the checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDataCache {
    pub countries: Vec<Country>,
    pub shipping_states: Vec<State>,
    pub billing_states: Vec<State>,
    pub card_months: Vec<u32>,
    pub card_years: Vec<i32>,
}

impl ReferenceDataCache {
    /// State list belonging to `group`.
    #[must_use]
    pub fn states(&self, group: AddressGroup) -> &[State] {
        match group {
            AddressGroup::Shipping => &self.shipping_states,
            AddressGroup::Billing => &self.billing_states,
        }
    }

    fn states_mut(&mut self, group: AddressGroup) -> &mut Vec<State> {
        match group {
            AddressGroup::Shipping => &mut self.shipping_states,
            AddressGroup::Billing => &mut self.billing_states,
        }
    }
}

/// Engine behavior that varies by deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Route to navigate to after an order is placed.
    pub success_route: String,
}

impl EngineSettings {
    pub const DEFAULT_SUCCESS_ROUTE: &str = "/products";
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            success_route: Self::DEFAULT_SUCCESS_ROUTE.to_string(),
        }
    }
}

/// Services the engine depends on.
#[derive(Clone)]
pub struct CheckoutCollaborators {
    pub reference_data: Arc<dyn ReferenceDataProvider>,
    pub cart: Arc<dyn CartSnapshotSource>,
    pub gateway: Arc<dyn OrderGateway>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was invalid. Every field is now touched; nothing was sent.
    Invalid {
        errors: BTreeMap<String, Vec<ValidationError>>,
    },
    /// The order was placed; cart and form have been reset.
    Placed { tracking_number: TrackingNumber },
    /// The gateway failed; cart and form are untouched.
    Failed { message: String },
}

impl SubmitOutcome {
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        matches!(self, Self::Placed { .. })
    }

    /// Acknowledgment text for the customer.
    ///
    /// `None` for an invalid form, which is reported only through its field
    /// errors.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Invalid { .. } => None,
            Self::Placed { tracking_number } => Some(format!(
                "Your order has been received.\nOrder tracking number: {tracking_number}"
            )),
            Self::Failed { message } => Some(format!("There was an error: {message}")),
        }
    }
}

/// Orchestrates one checkout from start to order placement.
pub struct CheckoutEngine {
    form: CheckoutForm,
    reference: ReferenceDataCache,
    totals: CartSubscription,
    collaborators: CheckoutCollaborators,
    settings: EngineSettings,
}

impl fmt::Debug for CheckoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutEngine")
            .field("form", &self.form)
            .field("reference", &self.reference)
            .field("totals", &self.totals.latest())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CheckoutEngine {
    /// Open a checkout.
    ///
    /// Subscribes to cart totals for the engine's lifetime, initializes the
    /// form, then loads card months (from the current month), card years,
    /// and countries. The three loads run concurrently and each populates
    /// its own list; a failed load leaves its list empty.
    #[instrument(skip_all)]
    pub async fn start(collaborators: CheckoutCollaborators, settings: EngineSettings) -> Self {
        let totals = collaborators.cart.subscribe();
        let mut engine = Self {
            form: CheckoutForm::initialize(),
            reference: ReferenceDataCache::default(),
            totals,
            collaborators,
            settings,
        };

        let start_month = engine.collaborators.clock.current_month();
        let provider = Arc::clone(&engine.collaborators.reference_data);
        let (months, years, countries) = tokio::join!(
            provider.credit_card_months(start_month),
            provider.credit_card_years(),
            provider.countries(),
        );

        match months {
            Ok(months) => engine.reference.card_months = months,
            Err(e) => warn!(error = %e, "Failed to load card months"),
        }
        match years {
            Ok(years) => engine.reference.card_years = years,
            Err(e) => warn!(error = %e, "Failed to load card years"),
        }
        match countries {
            Ok(countries) => engine.reference.countries = countries,
            Err(e) => warn!(error = %e, "Failed to load countries"),
        }

        let totals = engine.totals();
        info!(
            total_price = %totals.total_price,
            total_quantity = totals.total_quantity,
            countries = engine.reference.countries.len(),
            "Checkout started"
        );
        engine
    }

    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    #[must_use]
    pub const fn reference_data(&self) -> &ReferenceDataCache {
        &self.reference
    }

    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Latest cart totals pushed by the cart.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.totals.latest()
    }

    /// Wait until the cart publishes new totals.
    ///
    /// Returns `None` once the cart is gone.
    pub async fn next_totals(&mut self) -> Option<CartTotals> {
        self.totals.changed().await
    }

    /// Record user input into a field.
    ///
    /// # Errors
    ///
    /// Returns error if the path does not name a field.
    pub fn set_field_input(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.form.set_field_input(path, value)?;
        Ok(())
    }

    /// Record that the user left a field.
    ///
    /// # Errors
    ///
    /// Returns error if the path does not name a field.
    pub fn mark_touched(&mut self, path: &str) -> Result<()> {
        self.form.mark_touched(path)?;
        Ok(())
    }

    /// Select a country in an address group and reload its states.
    ///
    /// # Errors
    ///
    /// Returns error only on an internal form path mismatch.
    pub async fn select_country(&mut self, group: AddressGroup, country: Country) -> Result<()> {
        self.form
            .set_field_input(&group.group_name().path(fields::COUNTRY), country)?;
        self.refresh_states(group).await
    }

    /// Reload the state list of an address group for its selected country.
    ///
    /// The whole list is replaced, and the group's state is set to the first
    /// entry, or cleared if the country has no states. Without a selected
    /// country nothing is requested.
    ///
    /// # Errors
    ///
    /// Returns error only on an internal form path mismatch.
    #[instrument(skip(self, group), fields(group = %group))]
    pub async fn refresh_states(&mut self, group: AddressGroup) -> Result<()> {
        let Some(country) = self
            .form
            .group(group.group_name())
            .value(fields::COUNTRY)
            .as_country()
            .cloned()
        else {
            debug!("No country selected, skipping state refresh");
            return Ok(());
        };

        debug!(country_code = %country.code, country_name = %country.name, "Loading states");
        let states = match self
            .collaborators
            .reference_data
            .states(&country.code)
            .await
        {
            Ok(states) => states,
            Err(e) => {
                warn!(error = %e, country_code = %country.code, "Failed to load states");
                return Ok(());
            }
        };

        let first = states.first().cloned();
        *self.reference.states_mut(group) = states;
        self.form
            .set_value(&group.group_name().path(fields::STATE), first)?;
        Ok(())
    }

    /// Copy shipping into billing, or clear billing.
    ///
    /// Enabling copies every shipping field as currently selected, along with
    /// the shipping state list. The copy is one-shot: later shipping edits do
    /// not follow. Disabling resets billing and empties its state list.
    ///
    /// # Errors
    ///
    /// Returns error only on an internal form path mismatch.
    #[instrument(skip(self))]
    pub fn set_billing_same_as_shipping(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            let shipping = self.form.group_values(GroupName::ShippingAddress);
            self.form
                .set_group_value(GroupName::BillingAddress, &shipping)?;
            self.reference.billing_states = self.reference.shipping_states.clone();
        } else {
            self.form.reset_group(GroupName::BillingAddress);
            self.reference.billing_states.clear();
        }
        Ok(())
    }

    /// Select an expiration year and reload the month list.
    ///
    /// # Errors
    ///
    /// Returns error only on an internal form path mismatch.
    pub async fn select_expiration_year(&mut self, year: i32) -> Result<()> {
        self.form.set_field_input(
            &GroupName::CreditCard.path(fields::EXPIRATION_YEAR),
            FieldValue::Number(i64::from(year)),
        )?;
        self.refresh_card_months().await;
        Ok(())
    }

    /// Reload card months for the selected expiration year.
    ///
    /// In the current year only the remaining months (current month
    /// inclusive) are offered; any other year offers all twelve.
    #[instrument(skip(self))]
    pub async fn refresh_card_months(&mut self) {
        let selected = self.selected_expiration_year();
        let clock = &self.collaborators.clock;
        let start_month = if selected == Some(clock.current_year()) {
            clock.current_month()
        } else {
            1
        };

        match self
            .collaborators
            .reference_data
            .credit_card_months(start_month)
            .await
        {
            Ok(months) => {
                debug!(start_month, count = months.len(), "Card months loaded");
                self.reference.card_months = months;
            }
            Err(e) => warn!(error = %e, start_month, "Failed to load card months"),
        }
    }

    fn selected_expiration_year(&self) -> Option<i32> {
        match self
            .form
            .group(GroupName::CreditCard)
            .value(fields::EXPIRATION_YEAR)
        {
            FieldValue::Number(year) => i32::try_from(*year).ok(),
            FieldValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// The order that would be sent if the form were submitted now.
    #[must_use]
    pub fn assemble_submission(&self) -> OrderSubmission {
        submission::assemble(
            &self.form,
            self.totals(),
            &self.collaborators.cart.items(),
        )
    }

    /// Submit the checkout.
    ///
    /// An invalid form is only marked touched. Otherwise the order is placed
    /// with a single gateway call. On success the cart is emptied, the form
    /// reset, and the navigator sent to the success route; on failure
    /// nothing changes so the customer can retry.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.form.is_valid() {
            self.form.mark_all_touched();
            let errors = self.form.validate();
            warn!(invalid_fields = errors.len(), "Submission blocked by validation");
            return SubmitOutcome::Invalid { errors };
        }

        let order = self.assemble_submission();
        info!(
            total_price = %order.order.total_price,
            total_quantity = order.order.total_quantity,
            items = order.order_items.len(),
            "Placing order"
        );

        match self.collaborators.gateway.place_order(&order).await {
            Ok(response) => {
                let tracking_number = response.order_tracking_number;
                info!(%tracking_number, "Order placed");
                self.reset_after_order();
                SubmitOutcome::Placed { tracking_number }
            }
            Err(e) => {
                error!(error = %e, "Order placement failed");
                SubmitOutcome::Failed {
                    message: e.customer_message(),
                }
            }
        }
    }

    fn reset_after_order(&mut self) {
        self.collaborators.cart.reset();
        self.form.reset();
        self.collaborators
            .navigator
            .go_to(&self.settings.success_route);
    }
}
