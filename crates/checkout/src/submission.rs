//! Order submission assembly.

use tillpoint_core::{
    AddressPayload, CartLineItem, CartTotals, CustomerPayload, OrderItem, OrderSubmission,
};

use crate::form::{CheckoutForm, FieldGroup, GroupName, fields};

/// Build the order payload from cart state and a validated form.
///
/// Address `state` and `country` fields hold whole reference records while
/// the form is edited; here they are replaced by their display names.
#[must_use]
pub fn assemble(form: &CheckoutForm, totals: CartTotals, items: &[CartLineItem]) -> OrderSubmission {
    OrderSubmission {
        customer: customer(form.group(GroupName::Customer)),
        shipping_address: address(form.group(GroupName::ShippingAddress)),
        billing_address: address(form.group(GroupName::BillingAddress)),
        order: totals.into(),
        order_items: items.iter().map(OrderItem::from).collect(),
    }
}

fn customer(group: &FieldGroup) -> CustomerPayload {
    CustomerPayload {
        first_name: group.value(fields::FIRST_NAME).display_name(),
        last_name: group.value(fields::LAST_NAME).display_name(),
        email: group.value(fields::EMAIL).display_name(),
    }
}

fn address(group: &FieldGroup) -> AddressPayload {
    AddressPayload {
        street: group.value(fields::STREET).display_name(),
        city: group.value(fields::CITY).display_name(),
        state: group.value(fields::STATE).display_name(),
        country: group.value(fields::COUNTRY).display_name(),
        zip_code: group.value(fields::ZIP_CODE).display_name(),
    }
}
