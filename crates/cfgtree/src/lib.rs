//! cfgtree - typed configuration trees
//!
//! A config document is a tree of typed items: booleans, numbers, strings,
//! homogeneous lists and keyed groups. The tree loads from and saves to a
//! JSON file, and every item keeps the kind it was created with.
//!
//! ```no_run
//! use cfgtree::{Config, ConfigItem, ValueKind};
//!
//! let mut config = Config::with_path("settings.json");
//! config.add_item(ConfigItem::boolean("enabled", true))?;
//! config.save_file()?;
//!
//! let loaded = Config::open("settings.json")?;
//! assert!(loaded.get_item_as("enabled", ValueKind::Boolean)?.as_boolean()?);
//! # Ok::<(), cfgtree::ConfigError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::return_self_not_must_use
)]

pub mod document;
pub mod error;
pub mod group;
pub mod item;
pub mod kind;
pub mod list;
pub mod path;

pub use document::{Config, DocumentState};
pub use error::{ConfigError, ConfigResult};
pub use group::ConfigGroup;
pub use item::{ConfigItem, ConfigValue};
pub use kind::{kind_of_json, valid_type, ValueKind};
pub use list::ConfigList;
pub use path::KeyPath;
