//! Cart snapshot source.
//!
//! The checkout keeps its displayed totals current through a push
//! subscription: every change to the cart publishes fresh [`CartTotals`] on
//! a `tokio::sync::watch` channel. Line items are read once, at submission.

use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tillpoint_core::{CartLineItem, CartTotals, ProductRef};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A cart change that was refused. The cart is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity of {0} is too large")]
    QuantityOverflow(ProductRef),

    #[error("Cart total is out of range")]
    TotalOverflow,
}

/// Source of cart state consumed by the checkout.
pub trait CartSnapshotSource: Send + Sync {
    /// Register for total updates. Dropping the handle deregisters.
    fn subscribe(&self) -> CartSubscription;

    /// Current line items, in cart order.
    fn items(&self) -> Vec<CartLineItem>;

    /// Empty the cart and publish zero totals.
    fn reset(&self);
}

/// Handle on the cart's totals stream.
///
/// Always holds the latest published totals; dropping it tears the
/// subscription down.
#[derive(Debug, Clone)]
pub struct CartSubscription {
    receiver: watch::Receiver<CartTotals>,
}

impl CartSubscription {
    #[must_use]
    pub const fn new(receiver: watch::Receiver<CartTotals>) -> Self {
        Self { receiver }
    }

    /// The most recently published totals.
    #[must_use]
    pub fn latest(&self) -> CartTotals {
        *self.receiver.borrow()
    }

    /// Wait for the next publication.
    ///
    /// Returns `None` once the cart has been dropped.
    pub async fn changed(&mut self) -> Option<CartTotals> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }
}

/// A cart held in memory.
///
/// Lines are merged by product: adding a product already in the cart
/// increments its quantity.
#[derive(Debug)]
pub struct InMemoryCart {
    items: RwLock<Vec<CartLineItem>>,
    totals: watch::Sender<CartTotals>,
}

impl Default for InMemoryCart {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (totals, _) = watch::channel(CartTotals::default());
        Self {
            items: RwLock::new(Vec::new()),
            totals,
        }
    }

    /// Create a cart holding `items`.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartError`] raised while adding the lines.
    pub fn with_items(items: impl IntoIterator<Item = CartLineItem>) -> Result<Self, CartError> {
        let cart = Self::new();
        for item in items {
            cart.add_to_cart(item)?;
        }
        Ok(cart)
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the merged quantity or the cart totals would
    /// overflow.
    pub fn add_to_cart(&self, item: CartLineItem) -> Result<(), CartError> {
        self.update(|items| {
            match items.iter_mut().find(|i| i.product_ref == item.product_ref) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or_else(|| CartError::QuantityOverflow(item.product_ref.clone()))?;
                }
                None => items.push(item),
            }
            Ok(())
        })
    }

    /// Decrease a product's quantity by one, removing the line at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] if the remaining lines cannot be
    /// totalled.
    pub fn decrement_quantity(&self, product_ref: &ProductRef) -> Result<(), CartError> {
        self.update(|items| {
            if let Some(existing) = items.iter_mut().find(|i| &i.product_ref == product_ref) {
                existing.quantity = existing.quantity.saturating_sub(1);
            }
            items.retain(|i| i.quantity > 0);
            Ok(())
        })
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] if the remaining lines cannot be
    /// totalled.
    pub fn remove(&self, product_ref: &ProductRef) -> Result<(), CartError> {
        self.update(|items| {
            items.retain(|i| &i.product_ref != product_ref);
            Ok(())
        })
    }

    /// The most recently published totals.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        *self.totals.borrow()
    }

    /// Apply `change` to a copy of the lines and commit it only if the new
    /// totals can be computed.
    fn update(
        &self,
        change: impl FnOnce(&mut Vec<CartLineItem>) -> Result<(), CartError>,
    ) -> Result<(), CartError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = items.clone();
        let totals = change(&mut next)
            .and_then(|()| CartTotals::from_items(&next).ok_or(CartError::TotalOverflow))
            .inspect_err(|e| warn!(error = %e, "Cart change rejected"))?;

        *items = next;
        debug!(
            total_price = %totals.total_price,
            total_quantity = totals.total_quantity,
            "Cart totals changed"
        );
        self.totals.send_replace(totals);
        Ok(())
    }
}

impl CartSnapshotSource for InMemoryCart {
    fn subscribe(&self) -> CartSubscription {
        CartSubscription::new(self.totals.subscribe())
    }

    fn items(&self) -> Vec<CartLineItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset(&self) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.clear();
        debug!("Cart cleared");
        self.totals.send_replace(CartTotals::default());
    }
}
