/// Re-exports from alias-manager-mod-history and conversion traits.
/// Bridges the history crate's snapshot entries with AliasRecord.
pub use alias_manager_mod_history::config::history_id_for_path;
pub use alias_manager_mod_history::{
    HistoryConfig, PersistenceLayer, Snapshot, SnapshotEntry, SnapshotHistory,
};

use crate::model::AliasRecord;

impl From<SnapshotEntry> for AliasRecord {
    fn from(e: SnapshotEntry) -> Self {
        AliasRecord {
            name: e.name,
            command: e.command,
            section: e.section,
            description: e.description,
        }
    }
}

impl AliasRecord {
    pub fn to_snapshot_entry(&self) -> SnapshotEntry {
        SnapshotEntry {
            name: self.name.clone(),
            command: self.command.clone(),
            section: self.section.clone(),
            description: self.description.clone(),
        }
    }
}
