//! Config tree model tests
//!
//! Round-trips through JSON and the kind, homogeneity and uniqueness rules.

use cfgtree::{
    kind_of_json, valid_type, Config, ConfigError, ConfigGroup, ConfigItem, ConfigList,
    ConfigValue, ValueKind,
};
use serde_json::json;

/// A tree that touches every kind, including lists of groups and lists of lists
fn sample_tree() -> ConfigGroup {
    let ports = ConfigList::with_items(
        ValueKind::Number,
        vec![ConfigItem::number("", 80), ConfigItem::number("", 443)],
    )
    .unwrap();

    let matrix = ConfigList::with_items(
        ValueKind::List,
        vec![
            ConfigItem::list(
                "",
                ConfigList::from_items(vec![ConfigItem::boolean("", true)]).unwrap(),
            ),
            ConfigItem::list("", ConfigList::new()),
        ],
    )
    .unwrap();

    let backend = ConfigGroup::from_items(vec![
        ConfigItem::string("host", "10.0.0.1"),
        ConfigItem::float("weight", 0.75).unwrap(),
    ])
    .unwrap();
    let backends =
        ConfigList::with_items(ValueKind::Group, vec![ConfigItem::group("", backend)]).unwrap();

    let server = ConfigGroup::from_items(vec![
        ConfigItem::string("name", "edge"),
        ConfigItem::list("ports", ports),
        ConfigItem::list("backends", backends),
        ConfigItem::list("aliases", ConfigList::with_sub_kind(ValueKind::String)),
    ])
    .unwrap();

    ConfigGroup::from_items(vec![
        ConfigItem::boolean("enabled", true),
        ConfigItem::number("retries", -3),
        ConfigItem::group("server", server),
        ConfigItem::list("matrix", matrix),
        ConfigItem::group("empty", ConfigGroup::new()),
    ])
    .unwrap()
}

// =============================================================================
// Round-trip
// =============================================================================

#[test]
fn test_round_trip_preserves_every_node() {
    let tree = sample_tree();
    let text = serde_json::to_string(&tree).unwrap();
    let parsed = ConfigGroup::from_json(&serde_json::from_str(&text).unwrap()).unwrap();

    assert_eq!(parsed, tree);
    assert_eq!(parsed.to_json(), tree.to_json());
}

#[test]
fn test_round_trip_list_built_from_keyed_items() {
    let tags = ConfigList::from_items(vec![
        ConfigItem::number("x", 1),
        ConfigItem::number("y", 2),
    ])
    .unwrap();
    let tree = ConfigGroup::from_items(vec![ConfigItem::list("tags", tags)]).unwrap();

    let parsed = ConfigGroup::from_json(&tree.to_json()).unwrap();
    assert_eq!(parsed, tree);
}

#[test]
fn test_round_trip_through_config_text() {
    let config = Config::with_root(sample_tree(), "unused.json");
    let text = config.to_json_string().unwrap();
    let reparsed: Config = text.parse().unwrap();
    assert_eq!(reparsed.to_json(), config.to_json());
    assert_eq!(
        reparsed.root().keys().collect::<Vec<_>>(),
        vec!["enabled", "retries", "server", "matrix", "empty"]
    );
}

#[test]
fn test_integers_and_floats_keep_their_form() {
    let source = json!({ "i": 1, "f": 1.5, "big": u64::MAX });
    let parsed = ConfigGroup::from_json(&source).unwrap();
    assert_eq!(parsed.to_json(), source);
    assert_eq!(parsed.get_item("i").unwrap().as_number().unwrap().as_i64(), Some(1));
    assert_eq!(parsed.get_item("f").unwrap().as_number().unwrap().as_f64(), Some(1.5));
}

// =============================================================================
// Kind rules
// =============================================================================

#[test]
fn test_kind_never_changes() {
    let mut item = ConfigItem::number("n", 1);
    item.set_number(2).unwrap();
    assert!(item.set_value(ConfigValue::from("two")).is_err());
    assert!(item.set_value(ConfigValue::from(true)).is_err());
    assert!(item.set_value(ConfigValue::from(ConfigGroup::new())).is_err());
    assert_eq!(item.kind(), ValueKind::Number);
    assert_eq!(item.as_number().unwrap().as_i64(), Some(2));
}

#[test]
fn test_list_set_value_through_item() {
    let mut item = ConfigItem::list("l", ConfigList::new());
    let replacement = ConfigList::from_items(vec![ConfigItem::string("", "a")]).unwrap();
    item.set_value(replacement).unwrap();
    assert!(item.is_list_of(ValueKind::String));

    item.as_list_mut()
        .unwrap()
        .add_item(ConfigItem::string("", "b"))
        .unwrap();
    assert_eq!(item.to_json(), json!(["a", "b"]));
}

#[test]
fn test_list_rejects_other_kind() {
    let mut list = ConfigList::with_sub_kind(ValueKind::Number);
    list.add_item(ConfigItem::number("", 1)).unwrap();
    let err = list.add_item(ConfigItem::string("", "x")).unwrap_err();

    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    assert_eq!(list.len(), 1);
}

#[test]
fn test_group_uniqueness() {
    let mut group = ConfigGroup::new();
    group.add_item(ConfigItem::boolean("k", true)).unwrap();

    assert!(matches!(
        group.add_item(ConfigItem::boolean("k", false)),
        Err(ConfigError::DuplicateKey { .. })
    ));
    assert!(group.get_item("k").unwrap().as_boolean().unwrap());

    group.set_item(ConfigItem::boolean("k", false)).unwrap();
    assert_eq!(group.len(), 1);
    assert!(!group.get_item("k").unwrap().as_boolean().unwrap());
}

// =============================================================================
// Shape sniffing
// =============================================================================

#[test]
fn test_shape_sniffing_drives_rehydration() {
    let element = json!({ "a": [1, 2], "b": "s" });
    assert_eq!(kind_of_json(&element), Some(ValueKind::Group));
    assert!(valid_type(&element["a"], ValueKind::List));

    let item = ConfigItem::infer_from_json("doc", &element).unwrap();
    assert!(item.is_group());
    let group = item.as_group().unwrap();
    assert!(group.get_item("a").unwrap().is_list_of(ValueKind::Number));
    assert!(group.get_item("b").unwrap().is_string());
}

#[test]
fn test_from_json_with_declared_list_kind() {
    let list = ConfigList::from_json(&json!(["a", "b"]), ValueKind::String).unwrap();
    assert_eq!(list.len(), 2);

    match ConfigList::from_json(&json!(["a", 2]), ValueKind::String).unwrap_err() {
        ConfigError::MalformedConfig { location, message } => {
            assert_eq!(location, "$[1]");
            assert_eq!(message, "expected string, found number");
        }
        other => panic!("unexpected error: {other}"),
    }
}
