//! Config document: the root group plus its backing file
//!
//! A [`Config`] owns one unnamed [`ConfigGroup`] and, optionally, the path it
//! is loaded from and saved to. Key-based operations accept dotted paths
//! (`server.tls.enabled`) and otherwise behave like the same operations on
//! [`ConfigGroup`].
//!
//! Loading and saving are all-or-nothing: a failed [`Config::read_file`]
//! or [`Config::load_or_init`] leaves the in-memory tree as it was, and
//! [`Config::save_file`] writes through a temporary file so the target is
//! never left half-written.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::group::ConfigGroup;
use crate::item::{reject, ConfigItem, ROOT_LOCATION};
use crate::kind::{json_shape, ValueKind};
use crate::path::KeyPath;

/// Where a document stands relative to its backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    /// Never read from or written to disk
    Unloaded,
    /// In sync with the backing file
    Loaded,
    /// Changed since the last read or save
    Dirty,
}

/// Root configuration document
#[derive(Debug, Clone)]
pub struct Config {
    root: ConfigGroup,
    path: Option<PathBuf>,
    state: DocumentState,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Empty document with no backing file
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ConfigGroup::new(),
            path: None,
            state: DocumentState::Unloaded,
        }
    }

    /// Empty document backed by `path`; nothing is read yet
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new()
        }
    }

    /// Document whose root holds a single default item
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKey`] if the item's key contains `.`.
    pub fn with_item(item: ConfigItem, path: impl Into<PathBuf>) -> ConfigResult<Self> {
        Self::with_items(vec![item], path)
    }

    /// Document whose root holds `items` as defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidKey`] for a dotted key, or
    /// [`ConfigError::DuplicateKey`] if two items share a key.
    pub fn with_items(items: Vec<ConfigItem>, path: impl Into<PathBuf>) -> ConfigResult<Self> {
        Ok(Self::with_root(ConfigGroup::from_items(items)?, path))
    }

    /// Wrap a pre-built root group
    pub fn with_root(root: ConfigGroup, path: impl Into<PathBuf>) -> Self {
        Self {
            root,
            ..Self::with_path(path)
        }
    }

    /// Open and parse an existing file
    ///
    /// # Errors
    /// Same as [`Config::read_file`].
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::with_path(path);
        config.read_file()?;
        Ok(config)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    #[must_use]
    pub fn state(&self) -> DocumentState {
        self.state
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state == DocumentState::Dirty
    }

    #[must_use]
    pub fn root(&self) -> &ConfigGroup {
        &self.root
    }

    /// Mutable access to the whole tree; marks the document dirty
    pub fn root_mut(&mut self) -> &mut ConfigGroup {
        self.state = DocumentState::Dirty;
        &mut self.root
    }

    /// Whether a backing path is configured
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.path.is_some()
    }

    /// Whether the backing path exists on disk
    #[must_use]
    pub fn file_exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    // -- file I/O ----------------------------------------------------------

    /// Replace the tree with the contents of the backing file.
    ///
    /// # Errors
    /// - [`ConfigError::NoBackingFile`] if no path is configured
    /// - [`ConfigError::IoError`] if the file cannot be read
    /// - [`ConfigError::MalformedConfig`] if it is not a JSON object of valid items
    pub fn read_file(&mut self) -> ConfigResult<()> {
        let path = self.backing_path()?.to_path_buf();
        let content = read_text(&path)?;
        let root = parse_root(&content)?;

        debug!(
            path = %path.display(),
            bytes = content.len(),
            keys = root.len(),
            "read config file"
        );
        self.root = root;
        self.state = DocumentState::Loaded;
        Ok(())
    }

    /// Write the tree to the backing file, replacing its contents.
    ///
    /// # Errors
    /// - [`ConfigError::NoBackingFile`] if no path is configured
    /// - [`ConfigError::IoError`] if the file cannot be written
    pub fn save_file(&mut self) -> ConfigResult<()> {
        let path = self.backing_path()?.to_path_buf();
        let content = self.to_json_string()?;
        write_atomic(&path, &content)?;

        debug!(
            path = %path.display(),
            bytes = content.len(),
            keys = self.root.len(),
            "wrote config file"
        );
        self.state = DocumentState::Loaded;
        Ok(())
    }

    /// Load the backing file over the current tree, which acts as defaults.
    ///
    /// If the file does not exist yet, the defaults are written to it.
    /// Otherwise every field in the file overrides the default with the same
    /// key (and must have the same kind); fields without a default are added.
    ///
    /// # Errors
    /// Same as [`Config::read_file`] and [`Config::save_file`].
    pub fn load_or_init(&mut self) -> ConfigResult<()> {
        let path = self.backing_path()?.to_path_buf();
        if !path.exists() {
            info!(path = %path.display(), "config file missing, writing defaults");
            return self.save_file();
        }

        let content = read_text(&path)?;
        let value: Value = serde_json::from_str(&content)?;
        let Value::Object(fields) = &value else {
            return Err(expected_object(&value));
        };
        let merged = self.root.merge_json(fields, ROOT_LOCATION)?;

        debug!(
            path = %path.display(),
            fields = fields.len(),
            keys = merged.len(),
            "merged config file over defaults"
        );
        self.root = merged;
        self.state = DocumentState::Loaded;
        Ok(())
    }

    /// Serialize the tree as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }

    /// Serialize the tree as pretty-printed JSON text
    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    // -- key-based operations ----------------------------------------------

    /// Root-level items in order
    #[must_use]
    pub fn items(&self) -> &[ConfigItem] {
        self.root.items()
    }

    /// Add a root-level item; fails on a duplicate key
    pub fn add_item(&mut self, item: ConfigItem) -> ConfigResult<()> {
        self.root.add_item(item)?;
        self.state = DocumentState::Dirty;
        Ok(())
    }

    /// Insert or replace a root-level item
    pub fn set_item(&mut self, item: ConfigItem) -> ConfigResult<Option<ConfigItem>> {
        let previous = self.root.set_item(item)?;
        self.state = DocumentState::Dirty;
        Ok(previous)
    }

    /// Add an item to the group at `group_path`
    pub fn add_item_at(&mut self, group_path: &str, item: ConfigItem) -> ConfigResult<()> {
        self.group_at_mut(group_path)?.add_item(item)?;
        self.state = DocumentState::Dirty;
        Ok(())
    }

    /// Insert or replace an item in the group at `group_path`
    pub fn set_item_at(
        &mut self,
        group_path: &str,
        item: ConfigItem,
    ) -> ConfigResult<Option<ConfigItem>> {
        let previous = self.group_at_mut(group_path)?.set_item(item)?;
        self.state = DocumentState::Dirty;
        Ok(previous)
    }

    pub fn get_item(&self, path: &str) -> ConfigResult<&ConfigItem> {
        let path = KeyPath::parse(path);
        path.parent(&self.root)?
            .get_item(path.leaf())
            .map_err(|_| path.not_found())
    }

    /// Look up an item and require it to be of `expected` kind
    pub fn get_item_as(&self, path: &str, expected: ValueKind) -> ConfigResult<&ConfigItem> {
        let item = self.get_item(path)?;
        if item.kind() != expected {
            return Err(ConfigError::type_mismatch(
                format!("'{path}'"),
                expected,
                item.kind(),
            ));
        }
        Ok(item)
    }

    /// Mutable lookup; marks the document dirty when the item exists
    pub fn get_item_mut(&mut self, path: &str) -> ConfigResult<&mut ConfigItem> {
        let path = KeyPath::parse(path);
        let item = path
            .parent_mut(&mut self.root)?
            .get_item_mut(path.leaf())
            .map_err(|_| path.not_found())?;
        self.state = DocumentState::Dirty;
        Ok(item)
    }

    #[must_use]
    pub fn has_item(&self, path: &str) -> bool {
        let path = KeyPath::parse(path);
        path.parent(&self.root)
            .is_ok_and(|group| group.has_item(path.leaf()))
    }

    pub fn remove_item(&mut self, path: &str) -> ConfigResult<ConfigItem> {
        let path = KeyPath::parse(path);
        let removed = path
            .parent_mut(&mut self.root)?
            .remove_item(path.leaf())
            .map_err(|_| path.not_found())?;
        self.state = DocumentState::Dirty;
        Ok(removed)
    }

    pub fn get_type(&self, path: &str) -> ConfigResult<ValueKind> {
        self.get_item(path).map(ConfigItem::kind)
    }

    fn group_at_mut(&mut self, group_path: &str) -> ConfigResult<&mut ConfigGroup> {
        let path = KeyPath::parse(group_path);
        path.walk_mut(&mut self.root, path.segments())
    }

    fn backing_path(&self) -> ConfigResult<&Path> {
        self.path.as_deref().ok_or(ConfigError::NoBackingFile)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Parse JSON text into a document with no backing file
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            root: parse_root(s)?,
            path: None,
            state: DocumentState::Loaded,
        })
    }
}

fn parse_root(content: &str) -> ConfigResult<ConfigGroup> {
    let value: Value = serde_json::from_str(content)?;
    if !value.is_object() {
        return Err(expected_object(&value));
    }
    ConfigGroup::from_json(&value)
}

fn expected_object(value: &Value) -> ConfigError {
    reject(
        ROOT_LOCATION,
        format!("expected a JSON object at top level, found {}", json_shape(value)),
    )
}

fn io_error(path: &Path, err: &std::io::Error) -> ConfigError {
    ConfigError::IoError {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn read_text(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| io_error(path, &e))
}

fn write_atomic(path: &Path, content: &str) -> ConfigResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, &e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, &e))?;
    // The temp file is created 0600; a replaced file keeps its own mode
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| io_error(tmp.path(), &e))?;
    }
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| io_error(tmp.path(), &e))?;
    tmp.persist(path).map_err(|e| io_error(path, &e.error))?;
    Ok(())
}
