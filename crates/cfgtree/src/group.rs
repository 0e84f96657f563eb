//! Keyed config groups (nested namespaces)

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::item::{field_location, infer, reject, ConfigItem, ROOT_LOCATION};
use crate::kind::json_shape;
use crate::path::SEPARATOR;

/// Ordered mapping of key to config item.
///
/// Keys are unique and insertion order is kept, so a group always
/// serializes its fields in the same order. A key may not contain `.`,
/// which would make it unreachable through a dotted [`KeyPath`].
///
/// [`KeyPath`]: crate::path::KeyPath
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigGroup {
    items: Vec<ConfigItem>,
}

impl ConfigGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group holding `items`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKey`] for a dotted key, or
    /// [`ConfigError::DuplicateKey`] if two items share a key.
    pub fn from_items(items: Vec<ConfigItem>) -> ConfigResult<Self> {
        let mut group = Self::new();
        for item in items {
            group.add_item(item)?;
        }
        Ok(group)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order
    #[must_use]
    pub fn items(&self) -> &[ConfigItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigItem> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(ConfigItem::key)
    }

    #[must_use]
    pub fn has_item(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert an item under its own key.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKey`] for a dotted key and
    /// [`ConfigError::DuplicateKey`] if the key is already taken; the group is
    /// unchanged in both cases.
    pub fn add_item(&mut self, item: ConfigItem) -> ConfigResult<()> {
        check_key(item.key())?;
        if self.has_item(item.key()) {
            return Err(ConfigError::DuplicateKey {
                key: item.key().to_string(),
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Insert or replace. A replaced item keeps its position; the previous
    /// item is returned.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKey`] for a dotted key.
    pub fn set_item(&mut self, item: ConfigItem) -> ConfigResult<Option<ConfigItem>> {
        check_key(item.key())?;
        Ok(match self.position(item.key()) {
            Some(index) => Some(std::mem::replace(&mut self.items[index], item)),
            None => {
                self.items.push(item);
                None
            }
        })
    }

    pub fn get_item(&self, key: &str) -> ConfigResult<&ConfigItem> {
        self.items
            .iter()
            .find(|item| item.key() == key)
            .ok_or_else(|| ConfigError::key_not_found(key))
    }

    pub fn get_item_mut(&mut self, key: &str) -> ConfigResult<&mut ConfigItem> {
        self.items
            .iter_mut()
            .find(|item| item.key() == key)
            .ok_or_else(|| ConfigError::key_not_found(key))
    }

    /// Remove and return the item stored under `key`
    pub fn remove_item(&mut self, key: &str) -> ConfigResult<ConfigItem> {
        let index = self
            .position(key)
            .ok_or_else(|| ConfigError::key_not_found(key))?;
        Ok(self.items.remove(index))
    }

    /// Replace every member at once.
    ///
    /// # Errors
    /// Fails like [`ConfigGroup::from_items`]; the group is unchanged in that
    /// case.
    pub fn set_value(&mut self, items: Vec<ConfigItem>) -> ConfigResult<()> {
        *self = Self::from_items(items)?;
        Ok(())
    }

    /// Serialize as a JSON object, fields in insertion order
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for item in &self.items {
            item.write_to_object(&mut object);
        }
        Value::Object(object)
    }

    /// Rehydrate a group from a JSON object, inferring each field's kind.
    ///
    /// # Errors
    /// Returns [`ConfigError::MalformedConfig`] if `value` is not an object or
    /// if any field (at any depth) has no valid config shape.
    pub fn from_json(value: &Value) -> ConfigResult<Self> {
        match value {
            Value::Object(fields) => Self::rehydrate(fields, ROOT_LOCATION),
            _ => Err(reject(
                ROOT_LOCATION,
                format!("expected group, found {}", json_shape(value)),
            )),
        }
    }

    pub(crate) fn rehydrate(fields: &Map<String, Value>, location: &str) -> ConfigResult<Self> {
        let mut group = Self::new();
        for (key, value) in fields {
            let at = field_location(location, key);
            check_field(key, &at)?;
            group.items.push(infer(key.clone(), value, &at)?);
        }
        Ok(group)
    }

    /// Build a new group with `fields` laid over this one.
    ///
    /// Fields that match an existing key must keep that item's kind; nested
    /// groups merge recursively. Unknown fields are inferred and appended.
    pub(crate) fn merge_json(
        &self,
        fields: &Map<String, Value>,
        location: &str,
    ) -> ConfigResult<Self> {
        let mut merged = self.clone();
        for (key, value) in fields {
            let at = field_location(location, key);
            check_field(key, &at)?;
            let item = match self.items.iter().find(|item| item.key() == key) {
                Some(default) => default.merge_json(value, &at)?,
                None => infer(key.clone(), value, &at)?,
            };
            merged.set_item(item)?;
        }
        Ok(merged)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }
}

fn check_key(key: &str) -> ConfigResult<()> {
    if key.contains(SEPARATOR) {
        return Err(ConfigError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Same rule as [`check_key`], reported against a position in a JSON document
fn check_field(key: &str, location: &str) -> ConfigResult<()> {
    if key.contains(SEPARATOR) {
        return Err(reject(location, format!("key '{key}' contains '{SEPARATOR}'")));
    }
    Ok(())
}

impl<'a> IntoIterator for &'a ConfigGroup {
    type Item = &'a ConfigItem;
    type IntoIter = std::slice::Iter<'a, ConfigItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for ConfigGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.items.iter().map(|item| (item.key(), item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ValueKind;
    use crate::list::ConfigList;
    use serde_json::json;

    #[test]
    fn test_from_items_rejects_duplicates() {
        let group = ConfigGroup::from_items(vec![
            ConfigItem::boolean("1", false),
            ConfigItem::boolean("2", false),
        ])
        .unwrap();
        assert_eq!(group.len(), 2);

        let err = ConfigGroup::from_items(vec![
            ConfigItem::boolean("a", false),
            ConfigItem::number("a", 1),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey { key } if key == "a"));
    }

    #[test]
    fn test_add_duplicate_leaves_group_unchanged() {
        let mut group = ConfigGroup::new();
        group.add_item(ConfigItem::string("name", "first")).unwrap();

        let err = group.add_item(ConfigItem::string("name", "second")).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_KEY");
        assert_eq!(group.len(), 1);
        assert_eq!(group.get_item("name").unwrap().as_string().unwrap(), "first");
    }

    #[test]
    fn test_set_item_replaces_in_place() {
        let mut group = ConfigGroup::new();
        group.add_item(ConfigItem::string("a", "x")).unwrap();
        group.add_item(ConfigItem::string("b", "y")).unwrap();

        let previous = group.set_item(ConfigItem::number("a", 0)).unwrap();
        assert_eq!(previous, Some(ConfigItem::string("a", "x")));
        assert_eq!(group.len(), 2);
        assert_eq!(group.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(group.get_item("a").unwrap(), &ConfigItem::number("a", 0));

        assert!(group.set_item(ConfigItem::boolean("c", true)).unwrap().is_none());
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_dotted_key_is_rejected() {
        let mut group = ConfigGroup::new();
        let err = group.add_item(ConfigItem::boolean("a.b", true)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { key } if key == "a.b"));
        assert!(group.set_item(ConfigItem::boolean("a.b", true)).is_err());
        assert!(ConfigGroup::from_items(vec![ConfigItem::number("x.y", 1)]).is_err());
        assert!(group.is_empty());
    }

    #[test]
    fn test_lookup_symmetry() {
        let mut group = ConfigGroup::new();
        let item = ConfigItem::boolean("flag", true);
        group.set_item(item.clone()).unwrap();

        assert_eq!(group.get_item("flag").unwrap(), &item);
        assert!(group.has_item("flag"));

        let removed = group.remove_item("flag").unwrap();
        assert_eq!(removed, item);
        assert!(!group.has_item("flag"));
        assert!(matches!(
            group.get_item("flag"),
            Err(ConfigError::KeyNotFound { .. })
        ));
        assert!(matches!(
            group.remove_item("flag"),
            Err(ConfigError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_set_value_is_all_or_nothing() {
        let mut group = ConfigGroup::from_items(vec![ConfigItem::boolean("keep", true)]).unwrap();
        let dupes = vec![ConfigItem::boolean("x", true), ConfigItem::boolean("x", false)];
        assert!(group.set_value(dupes).is_err());
        assert!(group.has_item("keep"));

        group.set_value(vec![ConfigItem::number("n", 1)]).unwrap();
        assert!(!group.has_item("keep"));
        assert!(group.has_item("n"));
    }

    #[test]
    fn test_to_json_filled() {
        let group = ConfigGroup::from_items(vec![
            ConfigItem::string("str", "test"),
            ConfigItem::group(
                "obj",
                ConfigGroup::from_items(vec![ConfigItem::boolean("test", true)]).unwrap(),
            ),
            ConfigItem::list(
                "list",
                ConfigList::with_items(
                    ValueKind::Boolean,
                    vec![ConfigItem::boolean("", true), ConfigItem::boolean("", true)],
                )
                .unwrap(),
            ),
        ])
        .unwrap();

        assert_eq!(
            group.to_json(),
            json!({ "str": "test", "obj": { "test": true }, "list": [true, true] })
        );
    }

    #[test]
    fn test_to_json_keeps_insertion_order() {
        let group = ConfigGroup::from_items(vec![
            ConfigItem::number("zeta", 1),
            ConfigItem::number("alpha", 2),
        ])
        .unwrap();
        let text = serde_json::to_string(&group).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_from_json_filled() {
        let group = ConfigGroup::from_json(&json!({ "str": "test", "obj": { "test": true } }))
            .unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.get_item("str").unwrap().as_string().unwrap(), "test");
        let obj = group.get_item("obj").unwrap().as_group().unwrap();
        assert!(obj.get_item("test").unwrap().as_boolean().unwrap());
    }

    #[test]
    fn test_from_json_empty_and_invalid() {
        assert!(ConfigGroup::from_json(&json!({})).unwrap().is_empty());
        assert!(ConfigGroup::from_json(&json!([1])).is_err());
        assert!(ConfigGroup::from_json(&json!({ "n": null })).is_err());

        match ConfigGroup::from_json(&json!({ "outer": { "a.b": 1 } })).unwrap_err() {
            ConfigError::MalformedConfig { location, .. } => assert_eq!(location, "outer.a.b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_json_keeps_defaults_and_kinds() {
        let defaults = ConfigGroup::from_items(vec![
            ConfigItem::string("name", "default"),
            ConfigItem::number("retries", 3),
            ConfigItem::group(
                "net",
                ConfigGroup::from_items(vec![
                    ConfigItem::number("port", 80),
                    ConfigItem::string("host", "localhost"),
                ])
                .unwrap(),
            ),
        ])
        .unwrap();

        let merged = defaults
            .merge_json(
                json!({ "name": "custom", "net": { "port": 8080 }, "extra": true })
                    .as_object()
                    .unwrap(),
                ROOT_LOCATION,
            )
            .unwrap();

        assert_eq!(
            merged.to_json(),
            json!({
                "name": "custom",
                "retries": 3,
                "net": { "port": 8080, "host": "localhost" },
                "extra": true
            })
        );

        let err = defaults
            .merge_json(
                json!({ "net": { "port": "eighty" } }).as_object().unwrap(),
                ROOT_LOCATION,
            )
            .unwrap_err();
        match err {
            ConfigError::MalformedConfig { location, .. } => assert_eq!(location, "net.port"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_json_checks_declared_list_kind() {
        let defaults = ConfigGroup::from_items(vec![ConfigItem::list(
            "n",
            ConfigList::with_sub_kind(ValueKind::Number),
        )])
        .unwrap();
        let err = defaults
            .merge_json(json!({ "n": [1, "two"] }).as_object().unwrap(), ROOT_LOCATION)
            .unwrap_err();
        match err {
            ConfigError::MalformedConfig { location, .. } => assert_eq!(location, "n[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
