//! Integration tests for dependent selection lists.
//!
//! Country selections drive per-address state lists, the expiration year
//! drives the month list, and billing can be copied from shipping.

#![allow(clippy::unwrap_used)]

use tillpoint_checkout::{AddressGroup, FieldValue, GroupName};
use tillpoint_core::{Country, State};
use tillpoint_integration_tests::{
    CURRENT_MONTH, CURRENT_YEAR, TestContext, canada, united_states,
};

// =============================================================================
// Startup
// =============================================================================

#[tokio::test]
async fn test_start_loads_lists() {
    let ctx = TestContext::new().await;
    let reference = ctx.engine.reference_data();

    assert_eq!(reference.countries.len(), 3);
    assert_eq!(reference.card_months, vec![10, 11, 12]);
    assert_eq!(reference.card_years.first(), Some(&CURRENT_YEAR));
    assert_eq!(reference.card_years.last(), Some(&(CURRENT_YEAR + 10)));
    assert!(reference.shipping_states.is_empty());
    assert!(reference.billing_states.is_empty());

    let mut requests = ctx.reference_data.requests();
    requests.sort();
    assert_eq!(requests, ["countries", "months:10", "years"]);
}

// =============================================================================
// State Lists
// =============================================================================

#[tokio::test]
async fn test_country_selection_loads_states_and_picks_first() {
    let mut ctx = TestContext::new().await;

    ctx.engine
        .select_country(AddressGroup::Shipping, canada())
        .await
        .unwrap();

    assert_eq!(
        ctx.engine.reference_data().shipping_states,
        vec![State::new("ON", "Ontario"), State::new("QC", "Québec")]
    );
    assert_eq!(
        ctx.engine.form().get_value("shippingAddress.state"),
        Some(&FieldValue::State(State::new("ON", "Ontario")))
    );
    assert!(ctx.reference_data.requests().contains(&"states:CA".to_string()));
}

#[tokio::test]
async fn test_state_lists_are_independent() {
    let mut ctx = TestContext::new().await;

    ctx.engine
        .select_country(AddressGroup::Shipping, canada())
        .await
        .unwrap();
    ctx.engine
        .select_country(AddressGroup::Billing, united_states())
        .await
        .unwrap();

    let reference = ctx.engine.reference_data();
    assert_eq!(reference.states(AddressGroup::Shipping)[0].code, "ON");
    assert_eq!(reference.states(AddressGroup::Billing)[0].code, "NY");
    assert_eq!(
        ctx.engine.form().get_value("shippingAddress.state"),
        Some(&FieldValue::State(State::new("ON", "Ontario")))
    );
}

#[tokio::test]
async fn test_country_without_states_leaves_group_invalid() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;
    assert!(ctx.engine.form().is_group_valid(GroupName::ShippingAddress));

    ctx.engine
        .select_country(AddressGroup::Shipping, Country::new("AQ", "Antarctica"))
        .await
        .unwrap();

    assert!(ctx.engine.reference_data().shipping_states.is_empty());
    assert_eq!(
        ctx.engine.form().get_value("shippingAddress.state"),
        Some(&FieldValue::Empty)
    );
    assert!(!ctx.engine.form().is_group_valid(GroupName::ShippingAddress));
    assert!(!ctx.engine.submit().await.is_placed());
}

#[tokio::test]
async fn test_failed_state_load_keeps_previous_list() {
    let mut ctx = TestContext::new().await;
    ctx.engine
        .select_country(AddressGroup::Shipping, canada())
        .await
        .unwrap();

    ctx.reference_data.set_offline(true);
    ctx.engine
        .select_country(AddressGroup::Shipping, united_states())
        .await
        .unwrap();

    assert_eq!(ctx.engine.reference_data().shipping_states.len(), 2);
    assert_eq!(
        ctx.engine.form().get_value("shippingAddress.state"),
        Some(&FieldValue::State(State::new("ON", "Ontario")))
    );
    assert_eq!(
        ctx.engine.form().get_value("shippingAddress.country"),
        Some(&FieldValue::Country(united_states()))
    );
}

// =============================================================================
// Billing Copy
// =============================================================================

#[tokio::test]
async fn test_billing_copy_is_a_snapshot() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;

    let form = ctx.engine.form();
    assert_eq!(
        form.group_values(GroupName::BillingAddress),
        form.group_values(GroupName::ShippingAddress)
    );
    assert_eq!(
        ctx.engine.reference_data().billing_states,
        ctx.engine.reference_data().shipping_states
    );

    ctx.engine
        .select_country(AddressGroup::Shipping, united_states())
        .await
        .unwrap();

    assert_eq!(
        ctx.engine.form().get_value("billingAddress.country"),
        Some(&FieldValue::Country(canada()))
    );
    assert_eq!(ctx.engine.reference_data().billing_states[0].code, "ON");
}

#[tokio::test]
async fn test_clearing_billing_copy() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;

    ctx.engine.set_billing_same_as_shipping(false).unwrap();

    let billing = ctx.engine.form().group(GroupName::BillingAddress);
    assert!(billing.fields().all(|(_, f)| f.value().is_empty()));
    assert!(ctx.engine.reference_data().billing_states.is_empty());
    assert!(!ctx.engine.form().is_valid());
}

// =============================================================================
// Card Expiration
// =============================================================================

#[tokio::test]
async fn test_months_for_current_and_future_years() {
    let mut ctx = TestContext::new().await;

    ctx.engine
        .select_expiration_year(CURRENT_YEAR + 1)
        .await
        .unwrap();
    assert_eq!(
        ctx.engine.reference_data().card_months,
        (1..=12).collect::<Vec<u32>>()
    );

    ctx.engine.select_expiration_year(CURRENT_YEAR).await.unwrap();
    assert_eq!(
        ctx.engine.reference_data().card_months,
        (CURRENT_MONTH..=12).collect::<Vec<u32>>()
    );
    assert!(
        ctx.reference_data
            .requests()
            .ends_with(&["months:1".to_string(), "months:10".to_string()])
    );
}

#[tokio::test]
async fn test_failed_month_load_keeps_previous_list() {
    let mut ctx = TestContext::new().await;
    ctx.reference_data.set_offline(true);

    ctx.engine
        .select_expiration_year(CURRENT_YEAR + 2)
        .await
        .unwrap();

    assert_eq!(ctx.engine.reference_data().card_months, vec![10, 11, 12]);
    assert_eq!(
        ctx.engine.form().get_value("creditCard.expirationYear"),
        Some(&FieldValue::Number(i64::from(CURRENT_YEAR + 2)))
    );
}
