/// Bounded linear undo/redo over full snapshots.
///
/// `past` holds recorded states with the most recent on top; `future` holds
/// states popped by undo, most recently undone on top. Recording a new state
/// invalidates `future`. Only `past` is bounded by the configured capacity.
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::HistoryConfig;
use crate::persistence::{PersistenceLayer, Stack};
use crate::snapshot::Snapshot;

/// Manages undo/redo snapshots for a single alias collection.
///
/// The history can optionally mirror both stacks to disk via a shared
/// `PersistenceLayer`.
pub struct SnapshotHistory {
    /// Recorded states, oldest first.
    past: Vec<Snapshot>,
    /// Undone states, most recently undone last.
    future: Vec<Snapshot>,
    /// Identifier used as the persistence key.
    history_id: String,
    /// Configuration parameters.
    config: HistoryConfig,
    /// Optional disk persistence (None = in-memory only).
    persistence: Option<Arc<PersistenceLayer>>,
    /// Whether in-memory state has changed since the last flush.
    dirty: bool,
}

impl std::fmt::Debug for SnapshotHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("history_id", &self.history_id)
            .field("past_len", &self.past.len())
            .field("future_len", &self.future.len())
            .field("capacity", &self.config.capacity)
            .field("persistent", &self.persistence.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SnapshotHistory {
    /// Creates a new empty history.
    ///
    /// Pass `persistence: None` for in-memory-only mode.
    pub fn new(
        history_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            history_id,
            config,
            persistence,
            dirty: false,
        }
    }

    /// Creates an in-memory-only history with default capacity.
    pub fn in_memory() -> Self {
        Self::new(String::from("memory"), HistoryConfig::default(), None)
    }

    /// Loads existing stacks from disk, or creates a fresh history.
    ///
    /// If the stored `past` stack is larger than the configured capacity
    /// (capacity lowered since the last run), the oldest entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(
        history_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Result<Self> {
        let (mut past, future) = match &persistence {
            Some(pl) => {
                let meta = pl
                    .load_meta(&history_id)
                    .context("Failed to load history metadata")?;
                match meta {
                    Some(_) => {
                        let past = pl
                            .read_stack(&history_id, Stack::Past)
                            .context("Failed to load undo stack from disk")?;
                        let future = pl
                            .read_stack(&history_id, Stack::Future)
                            .context("Failed to load redo stack from disk")?;
                        (past, future)
                    }
                    None => (Vec::new(), Vec::new()),
                }
            }
            None => (Vec::new(), Vec::new()),
        };

        let mut dirty = false;
        if past.len() > config.capacity {
            let excess = past.len() - config.capacity;
            past.drain(..excess);
            tracing::debug!("Dropped {excess} stored snapshot(s) of '{history_id}' over capacity");
            dirty = true;
        }

        Ok(Self {
            past,
            future,
            history_id,
            config,
            persistence,
            dirty,
        })
    }

    /// Returns the history ID.
    pub fn history_id(&self) -> &str {
        &self.history_id
    }

    /// Returns the maximum size of the `past` stack.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Records a state.
    ///
    /// Clears the redo stack and evicts the oldest entries when `past`
    /// exceeds capacity.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.past.push(snapshot);
        self.future.clear();
        if self.past.len() > self.config.capacity {
            let excess = self.past.len() - self.config.capacity;
            self.past.drain(..excess);
        }
        self.dirty = true;
    }

    /// Steps back one state.
    ///
    /// Moves the top of `past` onto `future` and returns a copy of the new
    /// top of `past`, which is the state to restore. Returns `None` when
    /// `past` was empty (nothing happens) or has just become empty (there is
    /// no earlier recorded state).
    pub fn undo(&mut self) -> Option<Snapshot> {
        let state = self.past.pop()?;
        self.future.push(state);
        self.dirty = true;
        self.past.last().cloned()
    }

    /// Steps forward one state.
    ///
    /// Moves the top of `future` back onto `past` and returns a copy of it.
    /// Returns `None` if there's nothing to redo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let state = self.future.pop()?;
        self.past.push(state.clone());
        self.dirty = true;
        Some(state)
    }

    /// Whether `past` holds anything.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether redo is available.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of states on the `past` stack.
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of states on the `future` stack.
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// The most recently recorded (or redone) state.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.past.last()
    }

    /// Clears all history from memory and disk.
    ///
    /// # Errors
    ///
    /// Returns an error if disk cleanup fails.
    pub fn clear(&mut self) -> Result<()> {
        self.past.clear();
        self.future.clear();
        self.dirty = false;

        if let Some(pl) = &self.persistence {
            pl.delete_history(&self.history_id)
                .context("Failed to clear history from disk")?;
        }
        Ok(())
    }

    /// Writes both stacks to disk.
    ///
    /// No-op if the history is in-memory-only or nothing has changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(pl) = &self.persistence {
            pl.write_stacks(&self.history_id, &self.past, &self.future)
                .context("Failed to flush history to disk")?;
            tracing::debug!(
                "Flushed history '{}' ({} undo, {} redo)",
                self.history_id,
                self.past.len(),
                self.future.len()
            );
            self.dirty = false;
        }
        Ok(())
    }
}
