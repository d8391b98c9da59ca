//! Cart records read by the checkout workflow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductRef;

/// A single line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product this line refers to.
    pub product_ref: ProductRef,
    /// Product display name.
    #[serde(default)]
    pub name: String,
    /// Product image, if any.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Price of one unit.
    pub unit_price: Decimal,
    /// Number of units.
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line with no name or image.
    #[must_use]
    pub fn new(product_ref: impl Into<ProductRef>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            product_ref: product_ref.into(),
            name: String::new(),
            image_url: None,
            unit_price,
            quantity,
        }
    }

    /// Price of the whole line (`unit_price * quantity`).
    ///
    /// `None` if the product does not fit in a [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Aggregate price and quantity of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_price: Decimal,
    pub total_quantity: u32,
}

impl CartTotals {
    /// Sum the totals of a sequence of lines.
    ///
    /// Returns `None` when the total price or quantity overflows.
    #[must_use]
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a CartLineItem>) -> Option<Self> {
        items.into_iter().try_fold(Self::default(), |acc, item| {
            Some(Self {
                total_price: acc.total_price.checked_add(item.line_total()?)?,
                total_quantity: acc.total_quantity.checked_add(item.quantity)?,
            })
        })
    }
}
