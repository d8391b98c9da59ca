//! Core types for Tillpoint.
//!
//! This module provides type-safe wrappers and records for checkout concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod reference;

pub use cart::{CartLineItem, CartTotals};
pub use id::*;
pub use order::{
    AddressPayload, CustomerPayload, OrderItem, OrderSubmission, OrderSummary, PurchaseResponse,
};
pub use reference::{Country, State};
