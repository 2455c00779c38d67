/// Alias records and the ordered set of section names.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadWarning, StoreError};

/// One shell alias with its grouping and free-text description.
///
/// `name` is the key: the store never holds two records with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AliasRecord {
    #[serde(alias = "alias")]
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub description: String,
}

impl AliasRecord {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        section: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            section: section.into(),
            description: description.into(),
        }
    }

    /// Checks that the record can be written as a single `alias` line and
    /// read back unchanged.
    ///
    /// An empty section marks an unsectioned alias; any other section name
    /// must survive being written as a header.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidAlias` naming the first offending field.
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason: String| Err(StoreError::InvalidAlias(reason));

        if self.name.is_empty() {
            return invalid("name is required".to_string());
        }
        if let Some(c) = self
            .name
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '=' | '\'' | '"' | '`'))
        {
            return invalid(format!("name '{}' contains {c:?}", self.name));
        }
        if self.command.trim().is_empty() {
            return invalid(format!("command for '{}' is required", self.name));
        }
        if self.command.contains(['\n', '\r']) {
            return invalid(format!("command for '{}' spans several lines", self.name));
        }
        if self.section.is_empty() {
            return Ok(());
        }
        validate_section_name(&self.section)
    }
}

/// Checks that a section name survives being written as a `# name` header.
pub(crate) fn validate_section_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidAlias("section name is required".to_string()));
    }
    if name != name.trim() {
        return Err(StoreError::InvalidAlias(format!(
            "section '{name}' has leading or trailing whitespace"
        )));
    }
    if name.contains(['\n', '\r']) {
        return Err(StoreError::InvalidAlias(format!(
            "section '{name}' spans several lines"
        )));
    }
    Ok(())
}

/// Distinct section names in insertion order.
///
/// A section may exist with no aliases. The alias file has no place for
/// those, so the whole set is also kept in a small JSON document next to
/// the description document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionSet {
    names: Vec<String>,
}

impl SectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from names, dropping duplicates but keeping first-seen order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Adds a section. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Removes a section. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Renames a section in place, keeping its position.
    ///
    /// Returns `false` if `old` is missing or `new` already names another section.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old != new && self.contains(new) {
            return false;
        }
        match self.names.iter_mut().find(|n| *n == old) {
            Some(slot) => {
                *slot = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Section names in lexicographic order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.iter().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Reads a saved section list from `path`.
    ///
    /// A missing or empty file yields an empty set. A malformed one yields an
    /// empty set and a warning.
    pub fn load(path: &Path) -> (Self, Option<LoadWarning>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::new(), None),
            Err(e) => return Self::unreadable(path, e.to_string()),
        };
        if contents.trim().is_empty() {
            return (Self::new(), None);
        }
        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(names) => {
                let set = Self::from_names(names.into_iter().filter(|n| !n.is_empty()));
                tracing::debug!("Loaded {} section name(s) from {}", set.len(), path.display());
                (set, None)
            }
            Err(e) => Self::unreadable(path, e.to_string()),
        }
    }

    fn unreadable(path: &Path, reason: String) -> (Self, Option<LoadWarning>) {
        tracing::warn!("Ignoring section list {}: {reason}", path.display());
        (
            Self::new(),
            Some(LoadWarning::SectionsUnreadable {
                path: path.to_path_buf(),
                reason,
            }),
        )
    }

    /// Serializes the names in lexicographic order as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut json = serde_json::to_string_pretty(&self.sorted()).map_err(|source| {
            StoreError::Encode {
                what: "section list",
                source,
            }
        })?;
        json.push('\n');
        Ok(json)
    }
}
