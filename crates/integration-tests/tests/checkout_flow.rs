//! Integration tests for checkout submission.
//!
//! Covers the submission gate, the order payload that reaches the gateway,
//! and what happens to cart, form, and navigation after success or failure.

#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;
use tillpoint_checkout::{
    CartSnapshotSource, CheckoutForm, FieldValue, GroupName, InMemoryOrderGateway, SubmitOutcome,
    ValidationError,
};
use tillpoint_core::{CartLineItem, CartTotals};
use tillpoint_integration_tests::TestContext;

// =============================================================================
// Submission Gate
// =============================================================================

#[tokio::test]
async fn test_invalid_form_never_reaches_gateway() {
    let mut ctx = TestContext::new().await;

    let outcome = ctx.engine.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));
    assert_eq!(ctx.gateway.attempts(), 0);
    assert!(ctx.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_invalid_submit_touches_every_field() {
    let mut ctx = TestContext::new().await;
    ctx.engine
        .set_field_input("customer.firstName", FieldValue::text("Ada"))
        .unwrap();

    ctx.engine.submit().await;

    for group in ctx.engine.form().groups() {
        for (name, field) in group.fields() {
            assert!(field.is_touched(), "{}.{name} not touched", group.name());
        }
    }
    // Values survive
    assert_eq!(
        ctx.engine.form().get_value("customer.firstName"),
        Some(&FieldValue::text("Ada"))
    );
}

#[tokio::test]
async fn test_invalid_submit_reports_errors_by_path() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;
    ctx.engine
        .set_field_input("customer.email", FieldValue::text("ada@example"))
        .unwrap();
    ctx.engine
        .set_field_input("creditCard.securityCode", FieldValue::text("12"))
        .unwrap();

    let SubmitOutcome::Invalid { errors } = ctx.engine.submit().await else {
        panic!("expected invalid outcome");
    };

    assert_eq!(errors.len(), 2);
    assert!(matches!(
        errors["customer.email"].as_slice(),
        [ValidationError::Pattern { .. }]
    ));
    assert!(errors.contains_key("creditCard.securityCode"));
    assert_eq!(ctx.gateway.attempts(), 0);
}

#[tokio::test]
async fn test_whitespace_only_name_blocks_submission() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;
    ctx.engine
        .set_field_input("customer.lastName", FieldValue::text("   "))
        .unwrap();

    let outcome = ctx.engine.submit().await;

    let SubmitOutcome::Invalid { errors } = outcome else {
        panic!("expected invalid outcome");
    };
    assert!(
        errors["customer.lastName"].contains(&ValidationError::OnlyWhitespace),
        "{errors:?}"
    );
}

// =============================================================================
// Successful Submission
// =============================================================================

#[tokio::test]
async fn test_successful_submit_places_one_order() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;

    let outcome = ctx.engine.submit().await;

    let SubmitOutcome::Placed { tracking_number } = &outcome else {
        panic!("expected placed order, got {outcome:?}");
    };
    assert!(
        outcome
            .message()
            .is_some_and(|m| m.ends_with(&format!("Order tracking number: {tracking_number}")))
    );

    let placed = ctx.gateway.placed();
    assert_eq!(placed.len(), 1);
    let order = &placed[0].1;
    assert_eq!(order.order.total_price, dec!(59.98));
    assert_eq!(order.order.total_quantity, 2);
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.order_items[0].product_id.as_str(), "P1");
    assert_eq!(order.customer.email, "ada@example.com");
}

#[tokio::test]
async fn test_submitted_addresses_carry_names() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;

    ctx.engine.submit().await;

    let order = ctx.gateway.placed().remove(0).1;
    let json = serde_json::to_value(&order).unwrap();
    for address in ["shippingAddress", "billingAddress"] {
        assert_eq!(json[address]["country"], "Canada");
        assert_eq!(json[address]["state"], "Ontario");
    }
    assert_eq!(json["order"]["totalQuantity"], 2);
    assert_eq!(json["orderItems"][0]["productId"], "P1");
}

#[tokio::test]
async fn test_successful_submit_resets_everything() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;

    assert!(ctx.engine.submit().await.is_placed());

    assert!(ctx.cart.items().is_empty());
    assert_eq!(ctx.engine.totals(), CartTotals::default());
    assert_eq!(ctx.engine.form(), &CheckoutForm::initialize());
    assert!(!ctx.engine.form().is_valid());
    assert_eq!(ctx.navigator.routes(), vec!["/products".to_string()]);
}

#[tokio::test]
async fn test_each_order_gets_its_own_tracking_number() {
    let mut ctx = TestContext::new().await;
    ctx.fill_valid().await;
    let SubmitOutcome::Placed {
        tracking_number: first,
    } = ctx.engine.submit().await
    else {
        panic!("first order not placed");
    };

    ctx.cart.add_to_cart(CartLineItem::new("P2", dec!(5.00), 1)).unwrap();
    ctx.fill_valid().await;
    let SubmitOutcome::Placed {
        tracking_number: second,
    } = ctx.engine.submit().await
    else {
        panic!("second order not placed");
    };

    assert_ne!(first, second);
    let placed = ctx.gateway.placed();
    assert_eq!(placed[1].1.order.total_price, dec!(5.00));
}

// =============================================================================
// Failed Submission
// =============================================================================

#[tokio::test]
async fn test_gateway_failure_keeps_state() {
    let mut ctx = TestContext::with_gateway(InMemoryOrderGateway::failing("Card declined")).await;
    ctx.fill_valid().await;
    let form_before = ctx.engine.form().clone();

    let outcome = ctx.engine.submit().await;

    assert_eq!(
        outcome.message().as_deref(),
        Some("There was an error: Card declined")
    );
    assert_eq!(ctx.gateway.attempts(), 1);
    assert_eq!(ctx.engine.form(), &form_before);
    assert_eq!(ctx.cart.items().len(), 1);
    assert_eq!(ctx.engine.totals().total_price, dec!(59.98));
    assert!(ctx.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_retry_after_failure_without_reentry() {
    let mut ctx = TestContext::with_gateway(InMemoryOrderGateway::failing("Timeout")).await;
    ctx.fill_valid().await;

    assert!(matches!(
        ctx.engine.submit().await,
        SubmitOutcome::Failed { .. }
    ));
    ctx.gateway.fail_with(None);
    assert!(ctx.engine.submit().await.is_placed());

    // One failed attempt, one success, never retried by the engine itself
    assert_eq!(ctx.gateway.attempts(), 2);
    assert_eq!(ctx.gateway.placed().len(), 1);
}

// =============================================================================
// Cart Totals
// =============================================================================

#[tokio::test]
async fn test_totals_pushed_to_open_checkout() {
    let mut ctx = TestContext::new().await;
    assert_eq!(ctx.engine.totals().total_quantity, 2);

    ctx.cart.add_to_cart(CartLineItem::new("P1", dec!(29.99), 1)).unwrap();
    let totals = ctx.engine.next_totals().await.unwrap();

    assert_eq!(totals.total_quantity, 3);
    assert_eq!(totals.total_price, dec!(89.97));
    assert!(
        ctx.engine
            .form()
            .group(GroupName::Customer)
            .fields()
            .all(|(_, f)| !f.is_touched())
    );
}
