//! Dotted key paths (`group.sub.item`)

use crate::error::{ConfigError, ConfigResult};
use crate::group::ConfigGroup;

/// Separates the segments of a key path; group keys may not contain it
pub(crate) const SEPARATOR: char = '.';

/// A key path split on `.`; every segment but the last names a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> KeyPath<'a> {
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            segments: raw.split(SEPARATOR).collect(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Segments leading to the group that holds the leaf
    #[must_use]
    pub fn parents(&self) -> &[&'a str] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Final segment: the key inside the parent group
    #[must_use]
    pub fn leaf(&self) -> &'a str {
        self.segments[self.segments.len() - 1]
    }

    /// Walk `segments` from `root`, requiring each to be a group
    pub fn walk<'g>(
        &self,
        root: &'g ConfigGroup,
        segments: &[&str],
    ) -> ConfigResult<&'g ConfigGroup> {
        let mut group = root;
        for segment in segments {
            group = group
                .get_item(segment)
                .and_then(|item| item.as_group())
                .map_err(|_| self.not_found())?;
        }
        Ok(group)
    }

    pub fn walk_mut<'g>(
        &self,
        root: &'g mut ConfigGroup,
        segments: &[&str],
    ) -> ConfigResult<&'g mut ConfigGroup> {
        let mut group = root;
        for segment in segments {
            group = group
                .get_item_mut(segment)
                .and_then(|item| item.as_group_mut())
                .map_err(|_| self.not_found())?;
        }
        Ok(group)
    }

    /// Group holding the leaf
    pub fn parent<'g>(&self, root: &'g ConfigGroup) -> ConfigResult<&'g ConfigGroup> {
        self.walk(root, self.parents())
    }

    pub fn parent_mut<'g>(
        &self,
        root: &'g mut ConfigGroup,
    ) -> ConfigResult<&'g mut ConfigGroup> {
        self.walk_mut(root, self.parents())
    }

    /// Error for any miss along this path
    #[must_use]
    pub fn not_found(&self) -> ConfigError {
        ConfigError::key_not_found(self.raw)
    }
}
