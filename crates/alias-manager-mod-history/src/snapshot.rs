/// Immutable point-in-time copies of the alias collection.
use serde::{Deserialize, Serialize};

/// One alias as captured in a snapshot.
///
/// Mirrors the `AliasRecord` type from `alias-manager-core` but is
/// independently serializable without depending on the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub command: String,
    pub section: String,
    pub description: String,
}

/// A deep copy of `(aliases, sections)` at one point in time.
///
/// Fields are private: once built, a snapshot cannot be changed, only
/// cloned or consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    aliases: Vec<SnapshotEntry>,
    sections: Vec<String>,
}

impl Snapshot {
    /// Captures the given aliases and sections.
    pub fn new(aliases: Vec<SnapshotEntry>, sections: Vec<String>) -> Self {
        Self { aliases, sections }
    }

    /// Aliases in the order they were captured.
    pub fn aliases(&self) -> &[SnapshotEntry] {
        &self.aliases
    }

    /// Section names in the order they were captured.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Number of aliases captured.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the snapshot holds neither aliases nor sections.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.sections.is_empty()
    }

    /// Splits the snapshot into owned parts.
    pub fn into_parts(self) -> (Vec<SnapshotEntry>, Vec<String>) {
        (self.aliases, self.sections)
    }
}
