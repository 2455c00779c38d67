/// Alias descriptions, kept in a JSON document next to (not inside) the profile.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadWarning, StoreError};
use crate::io::write_atomic;

/// Mapping from alias name to description.
///
/// Empty descriptions are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionIndex {
    entries: BTreeMap<String, String>,
}

impl DescriptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the index from `path`.
    ///
    /// A missing file yields an empty index. An unreadable or malformed file
    /// also yields an empty index, together with a warning; the file itself
    /// is left alone.
    pub fn load(path: &Path) -> (Self, Option<LoadWarning>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::new(), None),
            Err(e) => return Self::unreadable(path, e.to_string()),
        };
        if contents.trim().is_empty() {
            return (Self::new(), None);
        }
        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(mut entries) => {
                entries.retain(|_, description| !description.is_empty());
                tracing::debug!("Loaded {} description(s) from {}", entries.len(), path.display());
                (Self { entries }, None)
            }
            Err(e) => Self::unreadable(path, e.to_string()),
        }
    }

    fn unreadable(path: &Path, reason: String) -> (Self, Option<LoadWarning>) {
        tracing::warn!("Ignoring description document {}: {reason}", path.display());
        (
            Self::new(),
            Some(LoadWarning::DescriptionsUnreadable {
                path: path.to_path_buf(),
                reason,
            }),
        )
    }

    /// Serializes the index as pretty-printed JSON with sorted keys.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut json = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StoreError::Encode {
                what: "description document",
                source,
            }
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Writes the index to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_atomic(path, self.to_json()?.as_bytes())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Sets the description for `name`; an empty description removes the entry.
    pub fn set(&mut self, name: &str, description: &str) {
        if description.is_empty() {
            self.entries.remove(name);
        } else {
            self.entries.insert(name.to_string(), description.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    /// Moves the entry for `old` to `new`, replacing whatever `new` held.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        match self.entries.remove(old) {
            Some(description) => {
                self.entries.insert(new.to_string(), description);
            }
            None => {
                self.entries.remove(new);
            }
        }
    }

    /// Drops entries whose name fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|name, _| keep(name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_without_warning() {
        let dir = TempDir::new().unwrap();
        let (index, warning) = DescriptionIndex::load(&dir.path().join("none.json"));
        assert!(index.is_empty());
        assert!(warning.is_none());
    }

    #[test]
    fn test_malformed_file_warns_and_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (index, warning) = DescriptionIndex::load(&path);
        assert!(index.is_empty());
        assert!(matches!(
            warning,
            Some(LoadWarning::DescriptionsUnreadable { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desc.json");
        let mut index = DescriptionIndex::new();
        index.set("gs", "Show status");
        index.set("gp", "Push");
        index.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        // Keys come out sorted
        assert!(text.find("\"gp\"").unwrap() < text.find("\"gs\"").unwrap());

        let (loaded, warning) = DescriptionIndex::load(&path);
        assert!(warning.is_none());
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_set_empty_removes() {
        let mut index = DescriptionIndex::new();
        index.set("gs", "status");
        index.set("gs", "");
        assert!(index.get("gs").is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_rename_moves_entry() {
        let mut index = DescriptionIndex::new();
        index.set("old", "text");
        index.set("new", "stale");
        index.rename("old", "new");
        assert_eq!(index.get("new"), Some("text"));
        assert!(index.get("old").is_none());

        // Renaming something without a description clears the target
        index.rename("ghost", "new");
        assert!(index.get("new").is_none());
    }

    #[test]
    fn test_retain() {
        let mut index = DescriptionIndex::new();
        index.set("a", "1");
        index.set("b", "2");
        index.retain(|name| name == "b");
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![("b", "2")]);
    }
}
