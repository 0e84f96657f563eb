//! Homogeneous config lists

use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::item::{element_location, infer, rehydrate, reject, ConfigItem, ROOT_LOCATION};
use crate::kind::{json_shape, ValueKind};

/// Ordered sequence of config items that all share one kind.
///
/// A list starts out untyped ([`ValueKind::UntypedArray`]) unless a sub-kind
/// is declared; the first item added then fixes it. Members are addressed by
/// position, so their keys are cleared on insert.
#[derive(Debug, Clone)]
pub struct ConfigList {
    sub_kind: ValueKind,
    items: Vec<ConfigItem>,
}

/// Lists are equal when their members are. An empty list's sub-kind is not
/// written to JSON, so it does not take part in the comparison.
impl PartialEq for ConfigList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && (self.items.is_empty() || self.sub_kind == other.sub_kind)
    }
}

impl Default for ConfigList {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigList {
    /// Create an empty list with an undetermined sub-kind
    #[must_use]
    pub fn new() -> Self {
        Self::with_sub_kind(ValueKind::UntypedArray)
    }

    /// Create an empty list limited to `sub_kind`
    #[must_use]
    pub fn with_sub_kind(sub_kind: ValueKind) -> Self {
        Self {
            sub_kind,
            items: Vec::new(),
        }
    }

    /// Create a list limited to `sub_kind` holding `items`
    pub fn with_items(sub_kind: ValueKind, items: Vec<ConfigItem>) -> ConfigResult<Self> {
        let mut list = Self::with_sub_kind(sub_kind);
        for item in items {
            list.add_item(item)?;
        }
        Ok(list)
    }

    /// Create a list whose sub-kind is taken from its first item
    pub fn from_items(items: Vec<ConfigItem>) -> ConfigResult<Self> {
        Self::with_items(ValueKind::UntypedArray, items)
    }

    /// Kind shared by every member, or `UntypedArray` if not yet known
    #[must_use]
    pub fn sub_kind(&self) -> ValueKind {
        self.sub_kind
    }

    #[must_use]
    pub fn is_untyped(&self) -> bool {
        self.sub_kind == ValueKind::UntypedArray
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[ConfigItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigItem> {
        self.items.iter()
    }

    /// Append an item.
    ///
    /// # Errors
    /// Returns [`ConfigError::TypeMismatch`] if the item's kind differs from
    /// the sub-kind. The list is unchanged in that case.
    pub fn add_item(&mut self, mut item: ConfigItem) -> ConfigResult<()> {
        if self.is_untyped() {
            self.sub_kind = item.kind();
        } else if item.kind() != self.sub_kind {
            return Err(ConfigError::type_mismatch(
                "list element",
                self.sub_kind,
                item.kind(),
            ));
        }
        item.clear_key();
        self.items.push(item);
        Ok(())
    }

    pub fn get_item(&self, index: usize) -> ConfigResult<&ConfigItem> {
        self.items.get(index).ok_or(ConfigError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn get_item_mut(&mut self, index: usize) -> ConfigResult<&mut ConfigItem> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(ConfigError::IndexOutOfRange { index, len })
    }

    /// Remove the item at `index`, shifting later items down
    pub fn remove_item(&mut self, index: usize) -> ConfigResult<ConfigItem> {
        if index >= self.items.len() {
            return Err(ConfigError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Replace every member at once.
    ///
    /// All items must share one kind, which becomes the new sub-kind. An
    /// empty sequence clears the list and keeps the current sub-kind.
    ///
    /// # Errors
    /// Returns [`ConfigError::TypeMismatch`] on a mixed-kind sequence.
    pub fn set_value(&mut self, mut items: Vec<ConfigItem>) -> ConfigResult<()> {
        let Some(first) = items.first() else {
            self.items.clear();
            return Ok(());
        };
        let sub_kind = first.kind();
        if let Some(odd) = items.iter().find(|item| item.kind() != sub_kind) {
            return Err(ConfigError::type_mismatch(
                "list element",
                sub_kind,
                odd.kind(),
            ));
        }
        items.iter_mut().for_each(ConfigItem::clear_key);
        self.sub_kind = sub_kind;
        self.items = items;
        Ok(())
    }

    /// Serialize as a JSON array, members in order
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut array = Vec::with_capacity(self.items.len());
        for item in &self.items {
            item.write_to_array(&mut array);
        }
        Value::Array(array)
    }

    /// Rehydrate a list from a JSON array.
    ///
    /// With a declared `sub_kind` every element is checked against it; with
    /// `UntypedArray` the first element decides and the rest must follow.
    ///
    /// # Errors
    /// Returns [`ConfigError::MalformedConfig`] if `value` is not an array or
    /// if any element's shape disagrees with the sub-kind.
    pub fn from_json(value: &Value, sub_kind: ValueKind) -> ConfigResult<Self> {
        match value {
            Value::Array(elements) => Self::rehydrate(elements, sub_kind, ROOT_LOCATION),
            _ => Err(reject(
                ROOT_LOCATION,
                format!("expected list, found {}", json_shape(value)),
            )),
        }
    }

    pub(crate) fn rehydrate(
        elements: &[Value],
        sub_kind: ValueKind,
        location: &str,
    ) -> ConfigResult<Self> {
        let mut list = Self::with_sub_kind(sub_kind);
        for (index, element) in elements.iter().enumerate() {
            let at = element_location(location, index);
            let item = if list.is_untyped() {
                infer(String::new(), element, &at)?
            } else {
                rehydrate(String::new(), element, list.sub_kind, &at)?
            };
            list.sub_kind = item.kind();
            list.items.push(item);
        }
        Ok(list)
    }
}

impl<'a> IntoIterator for &'a ConfigList {
    type Item = &'a ConfigItem;
    type IntoIter = std::slice::Iter<'a, ConfigItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for ConfigList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}
