//! The checkout form model.
//!
//! A [`CheckoutForm`] is a fixed tree of four [`FieldGroup`]s, each holding
//! named [`Field`]s. Every field carries its current value, the validators
//! bound to it at initialization, and `touched`/`dirty` flags used to decide
//! when its errors are displayed.
//!
//! Fields are addressed by dotted paths such as `"shippingAddress.country"`;
//! a path without a dot addresses a whole group.
//!
//! Validation never raises: an invalid value simply makes
//! [`CheckoutForm::is_valid`] return false and shows up in
//! [`CheckoutForm::validate`]. [`FormError`] is reserved for paths that do
//! not exist.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tillpoint_core::{Country, State};

use crate::validators::{self, PatternKind, ValidationError, Validator};

/// Field names used across the form.
pub mod fields {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";

    pub const STREET: &str = "street";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const COUNTRY: &str = "country";
    pub const ZIP_CODE: &str = "zipCode";

    pub const CARD_TYPE: &str = "cardType";
    pub const NAME_ON_CARD: &str = "nameOnCard";
    pub const CARD_NUMBER: &str = "cardNumber";
    pub const SECURITY_CODE: &str = "securityCode";
    pub const EXPIRATION_MONTH: &str = "expirationMonth";
    pub const EXPIRATION_YEAR: &str = "expirationYear";
}

/// Errors for paths that do not name a group or field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown form group: {0}")]
    UnknownGroup(String),
    #[error("unknown field {field} in group {group}")]
    UnknownField { group: GroupName, field: String },
}

/// The four field groups of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupName {
    Customer,
    ShippingAddress,
    BillingAddress,
    CreditCard,
}

impl GroupName {
    /// All groups in display order.
    pub const ALL: [Self; 4] = [
        Self::Customer,
        Self::ShippingAddress,
        Self::BillingAddress,
        Self::CreditCard,
    ];

    /// The group's path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::ShippingAddress => "shippingAddress",
            Self::BillingAddress => "billingAddress",
            Self::CreditCard => "creditCard",
        }
    }

    /// Dotted path of `field` within this group.
    #[must_use]
    pub fn path(self, field: &str) -> String {
        format!("{}.{field}", self.as_str())
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupName {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| FormError::UnknownGroup(s.to_string()))
    }
}

/// The value held by a form field.
///
/// Free-text inputs hold [`FieldValue::Text`]; dropdowns hold the record
/// that was selected, so address groups carry whole [`Country`] and
/// [`State`] records until submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Number(i64),
    Country(Country),
    State(State),
}

impl FieldValue {
    /// Shorthand for a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns true for [`FieldValue::Empty`] and empty text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_country(&self) -> Option<&Country> {
        match self {
            Self::Country(country) => Some(country),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_state(&self) -> Option<&State> {
        match self {
            Self::State(state) => Some(state),
            _ => None,
        }
    }

    /// The plain string form of the value.
    ///
    /// Reference records collapse to their display name; this is the
    /// normalization applied to addresses at submission time.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
            Self::Country(country) => country.name.clone(),
            Self::State(state) => state.name.clone(),
        }
    }
}

impl From<Country> for FieldValue {
    fn from(country: Country) -> Self {
        Self::Country(country)
    }
}

impl From<State> for FieldValue {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

impl From<Option<State>> for FieldValue {
    fn from(state: Option<State>) -> Self {
        state.map_or(Self::Empty, Self::State)
    }
}

/// A single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    value: FieldValue,
    validators: Vec<Validator>,
    touched: bool,
    dirty: bool,
}

impl Field {
    fn new(validators: Vec<Validator>) -> Self {
        Self {
            value: FieldValue::Empty,
            validators,
            touched: false,
            dirty: false,
        }
    }

    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    #[must_use]
    pub const fn is_touched(&self) -> bool {
        self.touched
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Every validator failure for the current value.
    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        validators::validate(&self.validators, &self.value)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validators.iter().all(|v| v.check(&self.value).is_none())
    }

    /// Whether errors should be displayed: invalid, and the user has either
    /// edited or left the field.
    #[must_use]
    pub fn shows_errors(&self) -> bool {
        (self.touched || self.dirty) && !self.is_valid()
    }

    fn reset(&mut self) {
        self.value = FieldValue::Empty;
        self.touched = false;
        self.dirty = false;
    }
}

/// Values of a group keyed by field name.
pub type GroupValues = BTreeMap<String, FieldValue>;

/// A named cluster of fields validated and reset as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    name: GroupName,
    fields: Vec<(&'static str, Field)>,
}

impl FieldGroup {
    fn new(name: GroupName, fields: Vec<(&'static str, Vec<Validator>)>) -> Self {
        Self {
            name,
            fields: fields
                .into_iter()
                .map(|(field, validators)| (field, Field::new(validators)))
                .collect(),
        }
    }

    fn address(name: GroupName) -> Self {
        Self::new(
            name,
            vec![
                (fields::STREET, Validator::free_text()),
                (fields::CITY, Validator::free_text()),
                (fields::STATE, Validator::selection()),
                (fields::COUNTRY, Validator::selection()),
                (fields::ZIP_CODE, Validator::free_text()),
            ],
        )
    }

    #[must_use]
    pub const fn name(&self) -> GroupName {
        self.name
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, field)| field)
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut Field, FormError> {
        let group = self.name;
        self.fields
            .iter_mut()
            .find(|(field, _)| *field == name)
            .map(|(_, field)| field)
            .ok_or_else(|| FormError::UnknownField {
                group,
                field: name.to_string(),
            })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }

    /// Value of a field, or [`FieldValue::Empty`] if the field is missing.
    #[must_use]
    pub fn value(&self, name: &str) -> &FieldValue {
        static EMPTY: FieldValue = FieldValue::Empty;
        self.field(name).map_or(&EMPTY, Field::value)
    }

    /// Snapshot of every field value.
    #[must_use]
    pub fn values(&self) -> GroupValues {
        self.fields
            .iter()
            .map(|(name, field)| ((*name).to_string(), field.value.clone()))
            .collect()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|(_, field)| field.is_valid())
    }

    fn reset(&mut self) {
        for (_, field) in &mut self.fields {
            field.reset();
        }
    }
}

/// A node addressed by a form path.
#[derive(Debug, Clone, Copy)]
pub enum FormNode<'a> {
    Group(&'a FieldGroup),
    Field(&'a Field),
}

/// The complete checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    customer: FieldGroup,
    shipping_address: FieldGroup,
    billing_address: FieldGroup,
    credit_card: FieldGroup,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self::initialize()
    }
}

impl CheckoutForm {
    /// Build the form with every field empty and its validators bound.
    ///
    /// A freshly initialized form is invalid: its required fields are unmet.
    #[must_use]
    pub fn initialize() -> Self {
        Self {
            customer: FieldGroup::new(
                GroupName::Customer,
                vec![
                    (fields::FIRST_NAME, Validator::free_text()),
                    (fields::LAST_NAME, Validator::free_text()),
                    (
                        fields::EMAIL,
                        Validator::required_pattern(PatternKind::Email),
                    ),
                ],
            ),
            shipping_address: FieldGroup::address(GroupName::ShippingAddress),
            billing_address: FieldGroup::address(GroupName::BillingAddress),
            credit_card: FieldGroup::new(
                GroupName::CreditCard,
                vec![
                    (fields::CARD_TYPE, Validator::selection()),
                    (fields::NAME_ON_CARD, Validator::free_text()),
                    (
                        fields::CARD_NUMBER,
                        Validator::required_pattern(PatternKind::CardNumber),
                    ),
                    (
                        fields::SECURITY_CODE,
                        Validator::required_pattern(PatternKind::SecurityCode),
                    ),
                    (fields::EXPIRATION_MONTH, Vec::new()),
                    (fields::EXPIRATION_YEAR, Vec::new()),
                ],
            ),
        }
    }

    #[must_use]
    pub const fn group(&self, name: GroupName) -> &FieldGroup {
        match name {
            GroupName::Customer => &self.customer,
            GroupName::ShippingAddress => &self.shipping_address,
            GroupName::BillingAddress => &self.billing_address,
            GroupName::CreditCard => &self.credit_card,
        }
    }

    const fn group_mut(&mut self, name: GroupName) -> &mut FieldGroup {
        match name {
            GroupName::Customer => &mut self.customer,
            GroupName::ShippingAddress => &mut self.shipping_address,
            GroupName::BillingAddress => &mut self.billing_address,
            GroupName::CreditCard => &mut self.credit_card,
        }
    }

    /// All groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = &FieldGroup> {
        GroupName::ALL.into_iter().map(|name| self.group(name))
    }

    fn split_path(path: &str) -> Result<(GroupName, &str), FormError> {
        let (group, field) = path
            .split_once('.')
            .ok_or_else(|| FormError::UnknownGroup(path.to_string()))?;
        Ok((group.parse()?, field))
    }

    fn field_mut(&mut self, path: &str) -> Result<&mut Field, FormError> {
        let (group, field) = Self::split_path(path)?;
        self.group_mut(group).field_mut(field)
    }

    /// Look up a group (`"customer"`) or field (`"customer.email"`).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<FormNode<'_>> {
        match path.split_once('.') {
            None => path
                .parse()
                .ok()
                .map(|group| FormNode::Group(self.group(group))),
            Some((group, field)) => {
                let group: GroupName = group.parse().ok()?;
                self.group(group).field(field).map(FormNode::Field)
            }
        }
    }

    /// Look up a field by path.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] if the path does not name a field.
    pub fn field(&self, path: &str) -> Result<&Field, FormError> {
        let (group, field) = Self::split_path(path)?;
        self.group(group)
            .field(field)
            .ok_or_else(|| FormError::UnknownField {
                group,
                field: field.to_string(),
            })
    }

    /// Value of the field at `path`, if it exists.
    #[must_use]
    pub fn get_value(&self, path: &str) -> Option<&FieldValue> {
        match self.get(path)? {
            FormNode::Field(field) => Some(field.value()),
            FormNode::Group(_) => None,
        }
    }

    /// Replace a field value programmatically. Flags are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] if the path does not name a field.
    pub fn set_value(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.field_mut(path)?.value = value.into();
        Ok(())
    }

    /// Replace a field value as the user would, marking it dirty.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] if the path does not name a field.
    pub fn set_field_input(
        &mut self,
        path: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let field = self.field_mut(path)?;
        field.value = value.into();
        field.dirty = true;
        Ok(())
    }

    /// Mark a single field as touched (the user left it).
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] if the path does not name a field.
    pub fn mark_touched(&mut self, path: &str) -> Result<(), FormError> {
        self.field_mut(path)?.touched = true;
        Ok(())
    }

    /// Overwrite the named fields of a group. Flags are left alone.
    ///
    /// Every key must name a field of the group; nothing is written if one
    /// does not.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownField`] for the first unknown key.
    pub fn set_group_value(
        &mut self,
        group: GroupName,
        values: &GroupValues,
    ) -> Result<(), FormError> {
        let target = self.group_mut(group);
        if let Some(unknown) = values.keys().find(|key| target.field(key).is_none()) {
            return Err(FormError::UnknownField {
                group,
                field: unknown.clone(),
            });
        }
        for (name, value) in values {
            target.field_mut(name)?.value = value.clone();
        }
        Ok(())
    }

    /// Snapshot of a group's values.
    #[must_use]
    pub fn group_values(&self, group: GroupName) -> GroupValues {
        self.group(group).values()
    }

    /// Restore a group to its empty defaults and clear its flags.
    pub fn reset_group(&mut self, group: GroupName) {
        self.group_mut(group).reset();
    }

    /// Restore every group to its empty defaults.
    pub fn reset(&mut self) {
        for group in GroupName::ALL {
            self.reset_group(group);
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.groups().all(FieldGroup::is_valid)
    }

    #[must_use]
    pub fn is_group_valid(&self, group: GroupName) -> bool {
        self.group(group).is_valid()
    }

    /// Flag every field as touched so that all errors become visible.
    pub fn mark_all_touched(&mut self) {
        for group in GroupName::ALL {
            for (_, field) in &mut self.group_mut(group).fields {
                field.touched = true;
            }
        }
    }

    /// Errors of the field at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] if the path does not name a field.
    pub fn errors(&self, path: &str) -> Result<Vec<ValidationError>, FormError> {
        Ok(self.field(path)?.errors())
    }

    /// Validate the whole tree, returning the failures of every invalid
    /// field keyed by path. An empty map means the form is valid.
    #[must_use]
    pub fn validate(&self) -> BTreeMap<String, Vec<ValidationError>> {
        self.groups()
            .flat_map(|group| {
                group.fields().filter_map(move |(name, field)| {
                    let errors = field.errors();
                    (!errors.is_empty()).then(|| (format!("{}.{name}", group.name()), errors))
                })
            })
            .collect()
    }
}
