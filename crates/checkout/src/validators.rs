//! Field-level validators.
//!
//! Validators are pure and stateless. A field carries a list of them and is
//! invalid if any one fails. Apart from [`Validator::Required`], validators
//! pass on empty values so that an untouched optional field never reports
//! more than one error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::form::FieldValue;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&anchored(PatternKind::Email.source())).expect("email pattern is valid")
});

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&anchored(PatternKind::CardNumber.source())).expect("card number pattern is valid")
});

static SECURITY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&anchored(PatternKind::SecurityCode.source()))
        .expect("security code pattern is valid")
});

/// Wrap a pattern so that it must match the whole value.
fn anchored(source: &str) -> String {
    format!("^(?:{source})$")
}

/// Named patterns used by checkout fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// Simplified RFC-like address, case-insensitive.
    Email,
    /// Exactly 16 digits.
    CardNumber,
    /// Exactly 3 digits.
    SecurityCode,
}

impl PatternKind {
    /// The unanchored pattern source.
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::Email => r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,4}",
            Self::CardNumber => "[0-9]{16}",
            Self::SecurityCode => "[0-9]{3}",
        }
    }

    /// The compiled, fully anchored regex.
    #[must_use]
    pub fn regex(self) -> &'static Regex {
        match self {
            Self::Email => &EMAIL,
            Self::CardNumber => &CARD_NUMBER,
            Self::SecurityCode => &SECURITY_CODE,
        }
    }

    /// Returns true if the whole of `value` matches.
    #[must_use]
    pub fn is_match(self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

/// A single failed constraint on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// The value is empty.
    Required,
    /// The value is shorter than `required` characters.
    MinLength { required: usize, actual: usize },
    /// The value does not match `pattern`.
    Pattern { pattern: PatternKind },
    /// The value is non-empty but consists only of whitespace.
    OnlyWhitespace,
}

impl ValidationError {
    /// Stable key for display lookups.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength { .. } => "minlength",
            Self::Pattern { .. } => "pattern",
            Self::OnlyWhitespace => "whitespace-only",
        }
    }
}

/// A constraint bound to a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Fails on an empty value.
    Required,
    /// Fails if a text value has fewer than `n` characters.
    MinLength(usize),
    /// Fails if a text value does not fully match the pattern.
    Pattern(PatternKind),
    /// Fails if a non-empty text value is all whitespace.
    NotOnlyWhitespace,
}

impl Validator {
    /// Check a single value.
    #[must_use]
    pub fn check(&self, value: &FieldValue) -> Option<ValidationError> {
        match *self {
            Self::Required => value.is_empty().then_some(ValidationError::Required),
            Self::MinLength(required) => {
                let text = value.as_text().filter(|t| !t.is_empty())?;
                let actual = text.chars().count();
                (actual < required).then_some(ValidationError::MinLength { required, actual })
            }
            Self::Pattern(pattern) => {
                let text = value.as_text().filter(|t| !t.is_empty())?;
                (!pattern.is_match(text)).then_some(ValidationError::Pattern { pattern })
            }
            Self::NotOnlyWhitespace => {
                let text = value.as_text().filter(|t| !t.is_empty())?;
                text.trim()
                    .is_empty()
                    .then_some(ValidationError::OnlyWhitespace)
            }
        }
    }

    /// Validator set for free-text fields such as names, street, and city.
    #[must_use]
    pub fn free_text() -> Vec<Self> {
        vec![Self::Required, Self::MinLength(2), Self::NotOnlyWhitespace]
    }

    /// Validator set for required selections such as country and state.
    #[must_use]
    pub fn selection() -> Vec<Self> {
        vec![Self::Required]
    }

    /// Validator set for a required value matching `pattern`.
    #[must_use]
    pub fn required_pattern(pattern: PatternKind) -> Vec<Self> {
        vec![Self::Required, Self::Pattern(pattern)]
    }
}

/// Run every validator against `value` and collect the failures.
#[must_use]
pub fn validate(validators: &[Validator], value: &FieldValue) -> Vec<ValidationError> {
    validators.iter().filter_map(|v| v.check(value)).collect()
}
