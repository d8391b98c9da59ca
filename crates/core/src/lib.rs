//! Tillpoint Core - Shared checkout types.
//!
//! This crate provides the types exchanged between Tillpoint components:
//! - `checkout` - The checkout workflow engine
//! - `cli` - Command-line driver for the engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no clocks.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype references, reference records, cart records and the
//!   order submission payload

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
