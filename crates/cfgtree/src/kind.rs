//! Value kinds and JSON shape sniffing

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The closed set of kinds a config item can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    List,
    Group,
    /// Array whose element kind is not known yet. Only used as a list sub-kind.
    UntypedArray,
}

impl ValueKind {
    /// Whether this kind holds a single primitive
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Boolean | Self::Number | Self::String)
    }

    /// Kinds that map to a JSON array
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(self, Self::List | Self::UntypedArray)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::List => write!(f, "list"),
            Self::Group => write!(f, "group"),
            Self::UntypedArray => write!(f, "untyped array"),
        }
    }
}

/// Infer a kind purely from JSON shape.
///
/// Returns `None` for `null`, which has no config kind.
#[must_use]
pub fn kind_of_json(value: &Value) -> Option<ValueKind> {
    match value {
        Value::Bool(_) => Some(ValueKind::Boolean),
        Value::Number(_) => Some(ValueKind::Number),
        Value::String(_) => Some(ValueKind::String),
        Value::Array(_) => Some(ValueKind::List),
        Value::Object(_) => Some(ValueKind::Group),
        Value::Null => None,
    }
}

/// Check that a JSON element has a shape compatible with `expected`
#[must_use]
pub fn valid_type(value: &Value, expected: ValueKind) -> bool {
    match kind_of_json(value) {
        Some(ValueKind::List) => expected.is_array(),
        Some(kind) => kind == expected,
        None => false,
    }
}

/// Human-readable JSON shape name, for error messages
pub(crate) fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
