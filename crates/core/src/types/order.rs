//! Order submission payload sent to the order backend.
//!
//! Field names serialize in camelCase (`shippingAddress`, `orderItems`,
//! `totalPrice`, ...) and prices serialize as JSON numbers, which is what the
//! purchase endpoint expects.
//!
//! Addresses carry country and state as plain display names. The structured
//! [`Country`](super::Country) and [`State`](super::State) records never reach
//! the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartLineItem, CartTotals};
use super::id::{ProductRef, TrackingNumber};

/// Customer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A postal address with name-only state and country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    /// State display name (e.g., "Ontario").
    pub state: String,
    /// Country display name (e.g., "Canada").
    pub country: String,
    pub zip_code: String,
}

/// Order-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub total_quantity: u32,
}

impl From<CartTotals> for OrderSummary {
    fn from(totals: CartTotals) -> Self {
        Self {
            total_price: totals.total_price,
            total_quantity: totals.total_quantity,
        }
    }
}

/// One ordered product, derived 1:1 from a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub image_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    pub product_id: ProductRef,
}

impl From<&CartLineItem> for OrderItem {
    fn from(item: &CartLineItem) -> Self {
        Self {
            image_url: item.image_url.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            product_id: item.product_ref.clone(),
        }
    }
}

/// The complete purchase sent to the order backend.
///
/// Built fresh for every submission attempt and never mutated once sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub customer: CustomerPayload,
    pub shipping_address: AddressPayload,
    pub billing_address: AddressPayload,
    pub order: OrderSummary,
    pub order_items: Vec<OrderItem>,
}

/// Successful response from the order backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub order_tracking_number: TrackingNumber,
}
