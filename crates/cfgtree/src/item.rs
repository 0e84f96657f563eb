//! Config items: one typed node in the configuration tree
//!
//! A [`ConfigItem`] pairs a key with a [`ConfigValue`]. The value is a closed
//! tagged union, so coercing an item to a concrete variant is a pattern match
//! that either yields the payload or fails with [`ConfigError::TypeMismatch`].

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::group::ConfigGroup;
use crate::kind::{json_shape, valid_type, ValueKind};
use crate::list::ConfigList;

/// Payload held by a config item
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Boolean(bool),
    Number(Number),
    String(String),
    List(ConfigList),
    Group(ConfigGroup),
}

impl ConfigValue {
    /// The natural kind of this payload
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
            Self::Group(_) => ValueKind::Group,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Number> for ConfigValue {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<ConfigList> for ConfigValue {
    fn from(value: ConfigList) -> Self {
        Self::List(value)
    }
}

impl From<ConfigGroup> for ConfigValue {
    fn from(value: ConfigGroup) -> Self {
        Self::Group(value)
    }
}

/// A named, typed, mutable config node.
///
/// The kind is fixed at construction: every setter checks the replacement
/// against it. Items stored in a [`ConfigList`] always have an empty key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigItem {
    key: String,
    value: ConfigValue,
}

impl ConfigItem {
    /// Create an item from any payload
    pub fn new(key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a boolean item
    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, value)
    }

    /// Create a number item from an integer (or an existing JSON number)
    pub fn number(key: impl Into<String>, value: impl Into<Number>) -> Self {
        Self::new(key, ConfigValue::Number(value.into()))
    }

    /// Create a number item from a float
    ///
    /// # Errors
    /// Returns [`ConfigError::NonFiniteNumber`] for NaN and infinities.
    pub fn float(key: impl Into<String>, value: f64) -> ConfigResult<Self> {
        Ok(Self::new(key, finite_number(value)?))
    }

    /// Create a string item
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, ConfigValue::String(value.into()))
    }

    /// Create a list item
    pub fn list(key: impl Into<String>, list: ConfigList) -> Self {
        Self::new(key, list)
    }

    /// Create a group item
    pub fn group(key: impl Into<String>, group: ConfigGroup) -> Self {
        Self::new(key, group)
    }

    /// Fresh, default-valued item of the requested kind.
    ///
    /// Scalars default to `false`, `0` and `""`. `List` and `UntypedArray`
    /// both give an empty list whose sub-kind is not yet determined.
    pub fn default_for(kind: ValueKind, key: impl Into<String>) -> Self {
        let value = match kind {
            ValueKind::Boolean => ConfigValue::Boolean(false),
            ValueKind::Number => ConfigValue::Number(Number::from(0)),
            ValueKind::String => ConfigValue::String(String::new()),
            ValueKind::List | ValueKind::UntypedArray => ConfigValue::List(ConfigList::new()),
            ValueKind::Group => ConfigValue::Group(ConfigGroup::new()),
        };
        Self::new(key, value)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    #[must_use]
    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> ConfigValue {
        self.value
    }

    pub(crate) fn clear_key(&mut self) {
        self.key.clear();
    }

    // -- coercion ----------------------------------------------------------

    pub fn as_boolean(&self) -> ConfigResult<bool> {
        match &self.value {
            ConfigValue::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch(ValueKind::Boolean)),
        }
    }

    pub fn as_number(&self) -> ConfigResult<&Number> {
        match &self.value {
            ConfigValue::Number(n) => Ok(n),
            _ => Err(self.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_string(&self) -> ConfigResult<&str> {
        match &self.value {
            ConfigValue::String(s) => Ok(s),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    pub fn as_list(&self) -> ConfigResult<&ConfigList> {
        match &self.value {
            ConfigValue::List(list) => Ok(list),
            _ => Err(self.mismatch(ValueKind::List)),
        }
    }

    pub fn as_list_mut(&mut self) -> ConfigResult<&mut ConfigList> {
        let err = self.mismatch(ValueKind::List);
        match &mut self.value {
            ConfigValue::List(list) => Ok(list),
            _ => Err(err),
        }
    }

    pub fn as_group(&self) -> ConfigResult<&ConfigGroup> {
        match &self.value {
            ConfigValue::Group(group) => Ok(group),
            _ => Err(self.mismatch(ValueKind::Group)),
        }
    }

    pub fn as_group_mut(&mut self) -> ConfigResult<&mut ConfigGroup> {
        let err = self.mismatch(ValueKind::Group);
        match &mut self.value {
            ConfigValue::Group(group) => Ok(group),
            _ => Err(err),
        }
    }

    // -- predicates --------------------------------------------------------

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.kind() == ValueKind::Boolean
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind() == ValueKind::Number
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind() == ValueKind::List
    }

    /// True for a list whose members are all of `sub_kind`
    #[must_use]
    pub fn is_list_of(&self, sub_kind: ValueKind) -> bool {
        matches!(&self.value, ConfigValue::List(list) if list.sub_kind() == sub_kind)
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind() == ValueKind::Group
    }

    // -- mutation ----------------------------------------------------------

    /// Replace the payload.
    ///
    /// # Errors
    /// Returns [`ConfigError::TypeMismatch`] if the new payload's kind differs
    /// from this item's kind. The item is left untouched in that case.
    pub fn set_value(&mut self, value: impl Into<ConfigValue>) -> ConfigResult<()> {
        let value = value.into();
        if value.kind() != self.kind() {
            return Err(self.mismatch_with(self.kind(), value.kind()));
        }
        self.value = value;
        Ok(())
    }

    pub fn set_boolean(&mut self, value: bool) -> ConfigResult<()> {
        self.set_value(value)
    }

    pub fn set_number(&mut self, value: impl Into<Number>) -> ConfigResult<()> {
        self.set_value(ConfigValue::Number(value.into()))
    }

    pub fn set_float(&mut self, value: f64) -> ConfigResult<()> {
        self.set_value(finite_number(value)?)
    }

    pub fn set_string(&mut self, value: impl Into<String>) -> ConfigResult<()> {
        self.set_value(ConfigValue::String(value.into()))
    }

    // -- JSON --------------------------------------------------------------

    /// Serialize this item's payload as a JSON element
    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.value {
            ConfigValue::Boolean(b) => Value::Bool(*b),
            ConfigValue::Number(n) => Value::Number(n.clone()),
            ConfigValue::String(s) => Value::String(s.clone()),
            ConfigValue::List(list) => list.to_json(),
            ConfigValue::Group(group) => group.to_json(),
        }
    }

    /// Append this item to a JSON array slot (positional, key ignored)
    pub fn write_to_array(&self, parent: &mut Vec<Value>) {
        parent.push(self.to_json());
    }

    /// Write this item into a JSON object under its key
    pub fn write_to_object(&self, parent: &mut Map<String, Value>) {
        parent.insert(self.key.clone(), self.to_json());
    }

    /// Rehydrate an item of an expected kind from a JSON element.
    ///
    /// # Errors
    /// Returns [`ConfigError::MalformedConfig`] if the element's shape is not
    /// compatible with `expected`, or if any nested element is malformed.
    pub fn from_json(
        key: impl Into<String>,
        value: &Value,
        expected: ValueKind,
    ) -> ConfigResult<Self> {
        let key = key.into();
        let location = root_location(&key);
        rehydrate(key, value, expected, &location)
    }

    /// Rehydrate an item whose kind is inferred from the JSON shape.
    ///
    /// # Errors
    /// Returns [`ConfigError::MalformedConfig`] for `null` anywhere in the
    /// element, or for arrays that mix element kinds.
    pub fn infer_from_json(key: impl Into<String>, value: &Value) -> ConfigResult<Self> {
        let key = key.into();
        let location = root_location(&key);
        infer(key, value, &location)
    }

    /// Merge a JSON element over this item, keeping this item's kind.
    pub(crate) fn merge_json(&self, value: &Value, location: &str) -> ConfigResult<Self> {
        let merged = match (&self.value, value) {
            (ConfigValue::Group(defaults), Value::Object(fields)) => {
                ConfigValue::Group(defaults.merge_json(fields, location)?)
            }
            (ConfigValue::List(defaults), Value::Array(elements)) => {
                ConfigValue::List(ConfigList::rehydrate(elements, defaults.sub_kind(), location)?)
            }
            _ => return rehydrate(self.key.clone(), value, self.kind(), location),
        };
        Ok(Self::new(self.key.clone(), merged))
    }

    fn describe(&self) -> String {
        if self.key.is_empty() {
            "unnamed item".to_string()
        } else {
            format!("'{}'", self.key)
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ConfigError {
        self.mismatch_with(expected, self.kind())
    }

    fn mismatch_with(&self, expected: ValueKind, found: ValueKind) -> ConfigError {
        ConfigError::type_mismatch(self.describe(), expected, found)
    }
}

impl Serialize for ConfigItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.value {
            ConfigValue::Boolean(b) => serializer.serialize_bool(*b),
            ConfigValue::Number(n) => n.serialize(serializer),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::List(list) => list.serialize(serializer),
            ConfigValue::Group(group) => group.serialize(serializer),
        }
    }
}

fn finite_number(value: f64) -> ConfigResult<Number> {
    Number::from_f64(value).ok_or(ConfigError::NonFiniteNumber(value))
}

// -- rehydration helpers shared with list and group -----------------------

/// Location of the document root in error messages
pub(crate) const ROOT_LOCATION: &str = "$";

fn root_location(key: &str) -> String {
    if key.is_empty() {
        ROOT_LOCATION.to_string()
    } else {
        key.to_string()
    }
}

pub(crate) fn field_location(parent: &str, key: &str) -> String {
    if parent == ROOT_LOCATION {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub(crate) fn element_location(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

pub(crate) fn reject(location: &str, message: String) -> ConfigError {
    warn!(location, reason = %message, "rejecting malformed config value");
    ConfigError::malformed(location, message)
}

/// Rehydrate `value` after checking it against `expected`
pub(crate) fn rehydrate(
    key: String,
    value: &Value,
    expected: ValueKind,
    location: &str,
) -> ConfigResult<ConfigItem> {
    if !valid_type(value, expected) {
        return Err(reject(
            location,
            format!("expected {expected}, found {}", json_shape(value)),
        ));
    }
    infer(key, value, location)
}

/// Rehydrate `value` with a kind taken from its own shape
pub(crate) fn infer(key: String, value: &Value, location: &str) -> ConfigResult<ConfigItem> {
    let value = match value {
        Value::Bool(b) => ConfigValue::Boolean(*b),
        Value::Number(n) => ConfigValue::Number(n.clone()),
        Value::String(s) => ConfigValue::String(s.clone()),
        Value::Array(elements) => ConfigValue::List(ConfigList::rehydrate(
            elements,
            ValueKind::UntypedArray,
            location,
        )?),
        Value::Object(fields) => ConfigValue::Group(ConfigGroup::rehydrate(fields, location)?),
        Value::Null => return Err(reject(location, "null has no config kind".to_string())),
    };
    Ok(ConfigItem { key, value })
}
