//! Tillpoint Checkout - The checkout workflow engine.
//!
//! Collects customer, address, and payment data through a validated form,
//! keeps dependent selection lists in step with the selections they depend on,
//! assembles the order payload from cart and form state, and drives the
//! post-submission transition.
//!
//! # Architecture
//!
//! The engine talks to its surroundings through ports:
//!
//! - [`ReferenceDataProvider`] - countries, states, card months and years
//! - [`CartSnapshotSource`] - cart totals (push) and line items (pull)
//! - [`OrderGateway`] - places the assembled order
//! - [`Navigator`] - leaves the checkout after a successful order
//! - [`Clock`] - today's date, for card expiration lists
//!
//! In-memory implementations of every port ship with the crate; HTTP
//! implementations of the reference-data and order ports live in [`http`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut engine = CheckoutEngine::start(collaborators, EngineSettings::default()).await;
//!
//! engine.set_field_input("customer.firstName", FieldValue::text("Ada"))?;
//! engine.select_country(AddressGroup::Shipping, canada).await?;
//! engine.set_billing_same_as_shipping(true)?;
//!
//! match engine.submit().await {
//!     SubmitOutcome::Placed { tracking_number } => println!("{tracking_number}"),
//!     SubmitOutcome::Invalid { errors } => highlight(&errors),
//!     failed => println!("{}", failed.message().unwrap_or_default()),
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod form;
pub mod gateway;
pub mod http;
pub mod reference;
pub mod submission;
pub mod validators;

pub use cart::{CartError, CartSnapshotSource, CartSubscription, InMemoryCart};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CheckoutConfig, ConfigError};
pub use engine::{
    AddressGroup, CheckoutCollaborators, CheckoutEngine, EngineSettings, ReferenceDataCache,
    SubmitOutcome,
};
pub use error::{CheckoutError, Result};
pub use form::{
    CheckoutForm, Field, FieldGroup, FieldValue, FormError, FormNode, GroupName, GroupValues,
};
pub use gateway::{
    GatewayError, InMemoryOrderGateway, Navigator, OrderGateway, RecordingNavigator,
};
pub use http::{HttpOrderGateway, HttpReferenceData};
pub use reference::{
    ReferenceDataError, ReferenceDataProvider, StaticReferenceData, card_months, card_years,
};
pub use validators::{PatternKind, ValidationError, Validator};
