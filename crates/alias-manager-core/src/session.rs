/// A store paired with its undo history.
/// The session records the state *after* each successful mutation, on top of
/// a baseline recorded when it was opened. The top of `past` therefore always
/// mirrors what is on disk, and undo steps back to the entry below it.
use std::path::Path;

use alias_manager_config::AppConfig;
use anyhow::{Context, Result};

use crate::alias_file::AliasFileFormat;
use crate::error::{LoadWarning, StoreError};
use crate::history::{history_id_for_path, HistoryConfig, PersistenceLayer, SnapshotHistory};
use crate::store::{AliasStore, StorePaths};

pub struct Session {
    store: AliasStore,
    history: SnapshotHistory,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("alias_file", &self.store.paths().alias_file)
            .field("history", &self.history)
            .finish()
    }
}

impl Session {
    /// Wraps an already loaded store.
    ///
    /// Records the store's state as a baseline unless the history already
    /// ends with exactly that state.
    pub fn new(store: AliasStore, mut history: SnapshotHistory) -> Self {
        let current = store.snapshot();
        if history.latest() != Some(&current) {
            if history.latest().is_some() {
                tracing::info!("Alias file changed outside the manager; starting a new baseline");
            }
            history.record(current);
        }
        Self { store, history }
    }

    /// Loads the store described by `config` and its persisted history.
    ///
    /// Problems with the alias or description files are load warnings. If
    /// the history database cannot be opened or read, the session keeps its
    /// history in memory for this run and logs a warning.
    pub fn open(config: &AppConfig, data_dir: &Path) -> (Self, Vec<LoadWarning>) {
        let paths = StorePaths::from_config(config, data_dir);
        let format = AliasFileFormat::new(config.marker.as_str(), config.sub_item_prefix.as_str());
        let history_id = history_id_for_path(&paths.alias_file);
        let (store, warnings) = AliasStore::open(paths, format);

        let history_config = HistoryConfig::with_capacity(config.history_capacity, data_dir);
        let history = match load_history(&history_id, &history_config) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Undo history is not persistent for this run: {e:#}");
                SnapshotHistory::new(history_id, history_config, None)
            }
        };

        (Self::new(store, history), warnings)
    }

    pub fn store(&self) -> &AliasStore {
        &self.store
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Runs a mutation and records the resulting state.
    ///
    /// Nothing is recorded when `op` fails or leaves the state unchanged.
    pub fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut AliasStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let value = op(&mut self.store)?;
        let current = self.store.snapshot();
        if self.history.latest() != Some(&current) {
            self.history.record(current);
        }
        Ok(value)
    }

    /// Whether there is an earlier state than the current one.
    pub fn can_undo(&self) -> bool {
        self.history.past_len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of undo steps available.
    pub fn undo_steps(&self) -> usize {
        self.history.past_len().saturating_sub(1)
    }

    pub fn redo_steps(&self) -> usize {
        self.history.future_len()
    }

    /// Restores the previous state. Returns `false` if there is none.
    ///
    /// If the restore cannot be written, the history is put back as it was.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        if !self.can_undo() {
            return Ok(false);
        }
        let Some(snapshot) = self.history.undo() else {
            self.history.redo();
            return Ok(false);
        };
        if let Err(e) = self.store.restore(snapshot) {
            self.history.redo();
            return Err(e);
        }
        Ok(true)
    }

    /// Re-applies the most recently undone state. Returns `false` if there is none.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        if let Err(e) = self.store.restore(snapshot) {
            self.history.undo();
            return Err(e);
        }
        Ok(true)
    }

    /// Writes the history to disk if it is persistent and has changed.
    pub fn flush(&mut self) -> Result<()> {
        self.history.flush()
    }

    /// Drops all undo and redo states, keeping the current one as baseline.
    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()?;
        self.history.record(self.store.snapshot());
        Ok(())
    }
}

fn load_history(history_id: &str, config: &HistoryConfig) -> Result<SnapshotHistory> {
    let persistence =
        PersistenceLayer::open(&config.data_dir).context("Failed to open history database")?;
    SnapshotHistory::load_or_new(history_id.to_string(), config.clone(), Some(persistence))
        .context("Failed to load undo history")
}
