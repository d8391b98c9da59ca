//! Reference records offered in checkout selection lists.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A country a customer can ship to or be billed in.
///
/// Address groups hold the whole record while the customer is editing; only
/// [`Country::name`] crosses into the order payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code (e.g., "CA").
    pub code: String,
    /// Display name (e.g., "Canada").
    pub name: String,
}

impl Country {
    /// Create a new country record.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A state, province, or region within a [`Country`].
///
/// Some backends only return names for states, so `code` defaults to empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Subdivision code (e.g., "ON").
    #[serde(default)]
    pub code: String,
    /// Display name (e.g., "Ontario").
    pub name: String,
}

impl State {
    /// Create a new state record.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
