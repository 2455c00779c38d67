/// Disk persistence layer backed by redb.
///
/// Uses a single redb database file with two tables:
/// - `snapshots`: bincode-serialized `Snapshot` entries keyed by
///   `"{history_id}#{stack}#{position:020}"`
/// - `meta`: per-history stack sizes keyed by `history_id`
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::snapshot::Snapshot;

/// Snapshot table: composite string key → bincode-serialized Snapshot.
const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Metadata table: history_id → bincode-serialized HistoryMeta.
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Which of the two history stacks an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    Past,
    Future,
}

impl Stack {
    fn as_str(self) -> &'static str {
        match self {
            Stack::Past => "past",
            Stack::Future => "future",
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-history metadata persisted alongside the stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryMeta {
    pub past_len: u64,
    pub future_len: u64,
}

/// Formats a snapshot table key.
///
/// The position is zero-padded to 20 digits to ensure correct lexicographic
/// ordering in the B-tree. Position 0 is the bottom of the stack.
fn snapshot_key(history_id: &str, stack: Stack, position: usize) -> String {
    format!("{history_id}#{stack}#{position:020}")
}

/// Returns the exclusive range bounds for all entries of one stack.
///
/// Uses `#` as separator and `$` (one ASCII codepoint above `#`) as the
/// exclusive upper bound.
fn stack_range(history_id: &str, stack: Stack) -> (String, String) {
    let start = format!("{history_id}#{stack}#");
    let end = format!("{history_id}#{stack}$");
    (start, end)
}

/// Persistence layer for snapshot history backed by redb.
///
/// Shared across histories via `Arc<PersistenceLayer>`.
pub struct PersistenceLayer {
    db: Database,
}

impl fmt::Debug for PersistenceLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceLayer").finish()
    }
}

impl PersistenceLayer {
    /// Opens or creates the history database in the given directory.
    ///
    /// Creates the directory and database file if they don't exist.
    /// Initializes tables on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("history.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open history database: {}", db_path.display()))?;

        // Ensure tables exist
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to create snapshots table")?;
            let _ = write_txn
                .open_table(META_TABLE)
                .context("Failed to create meta table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        Ok(Arc::new(Self { db }))
    }

    /// Replaces both stacks of a history in one transaction.
    ///
    /// Entries previously stored for the history are removed first, so the
    /// on-disk stacks always mirror exactly what was passed in.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write transaction fails.
    pub fn write_stacks(
        &self,
        history_id: &str,
        past: &[Snapshot],
        future: &[Snapshot],
    ) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to open snapshots table")?;

            for (stack, entries) in [(Stack::Past, past), (Stack::Future, future)] {
                let (start, end) = stack_range(history_id, stack);
                let stale: Vec<String> = table
                    .range::<&str>(start.as_str()..end.as_str())
                    .context("Failed to range query snapshots table")?
                    .filter_map(|entry| entry.ok().map(|(k, _)| k.value().to_string()))
                    .collect();
                for key in &stale {
                    table
                        .remove(key.as_str())
                        .context("Failed to remove stale snapshot")?;
                }

                for (position, snapshot) in entries.iter().enumerate() {
                    let key = snapshot_key(history_id, stack, position);
                    let bytes =
                        bincode::serialize(snapshot).context("Failed to serialize snapshot")?;
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .context("Failed to insert snapshot")?;
                }
            }
        }
        {
            let meta = HistoryMeta {
                past_len: past.len() as u64,
                future_len: future.len() as u64,
            };
            let bytes =
                bincode::serialize(&meta).context("Failed to serialize history metadata")?;
            let mut meta_table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            meta_table
                .insert(history_id, bytes.as_slice())
                .context("Failed to insert metadata")?;
        }
        write_txn
            .commit()
            .context("Failed to commit write transaction")?;
        Ok(())
    }

    /// Reads one stack of a history, bottom first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction or deserialization fails.
    pub fn read_stack(&self, history_id: &str, stack: Stack) -> Result<Vec<Snapshot>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SNAPSHOT_TABLE)
            .context("Failed to open snapshots table")?;

        let (start, end) = stack_range(history_id, stack);
        let mut snapshots = Vec::new();

        for entry in table
            .range::<&str>(start.as_str()..end.as_str())
            .context("Failed to range query snapshots table")?
        {
            let (_, value_guard) = entry.context("Failed to read snapshot entry")?;
            let snapshot: Snapshot = bincode::deserialize(value_guard.value())
                .context("Failed to deserialize snapshot")?;
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    /// Counts the snapshots stored on one stack of a history.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction fails.
    pub fn count(&self, history_id: &str, stack: Stack) -> Result<usize> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SNAPSHOT_TABLE)
            .context("Failed to open snapshots table")?;

        let (start, end) = stack_range(history_id, stack);
        let count = table
            .range::<&str>(start.as_str()..end.as_str())
            .context("Failed to range query for count")?
            .count();

        Ok(count)
    }

    /// Loads the metadata of a history.
    ///
    /// Returns `None` if nothing was ever flushed for this history.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction or deserialization fails.
    pub fn load_meta(&self, history_id: &str) -> Result<Option<HistoryMeta>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(META_TABLE)
            .context("Failed to open meta table")?;

        match table.get(history_id).context("Failed to read metadata")? {
            Some(guard) => {
                let meta: HistoryMeta = bincode::deserialize(guard.value())
                    .context("Failed to deserialize metadata")?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    /// Removes both stacks and the metadata of a history.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails.
    pub fn delete_history(&self, history_id: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to open snapshots table")?;

            for stack in [Stack::Past, Stack::Future] {
                let (start, end) = stack_range(history_id, stack);
                let keys_to_remove: Vec<String> = table
                    .range::<&str>(start.as_str()..end.as_str())
                    .context("Failed to range query for deletion")?
                    .filter_map(|entry| entry.ok().map(|(k, _)| k.value().to_string()))
                    .collect();

                for key in &keys_to_remove {
                    table
                        .remove(key.as_str())
                        .context("Failed to remove entry")?;
                }
            }
        }
        {
            let mut meta_table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            let _ = meta_table.remove(history_id);
        }
        write_txn.commit().context("Failed to commit deletion")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotEntry;
    use tempfile::TempDir;

    fn snap(names: &[&str]) -> Snapshot {
        Snapshot::new(
            names
                .iter()
                .map(|n| SnapshotEntry {
                    name: n.to_string(),
                    command: format!("echo {n}"),
                    section: "test".to_string(),
                    description: String::new(),
                })
                .collect(),
            vec!["test".to_string()],
        )
    }

    fn open_layer() -> (Arc<PersistenceLayer>, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let pl = PersistenceLayer::open(dir.path()).expect("open db");
        (pl, dir)
    }

    #[test]
    fn test_snapshot_key_ordering() {
        let k2 = snapshot_key("h", Stack::Past, 2);
        let k10 = snapshot_key("h", Stack::Past, 10);
        assert!(k2 < k10);
        let (start, end) = stack_range("h", Stack::Past);
        assert!(k2.as_str() > start.as_str() && k10.as_str() < end.as_str());
    }

    #[test]
    fn test_past_and_future_ranges_do_not_overlap() {
        let future_key = snapshot_key("h", Stack::Future, 0);
        let (start, end) = stack_range("h", Stack::Past);
        assert!(!(future_key.as_str() >= start.as_str() && future_key.as_str() < end.as_str()));
    }

    #[test]
    fn test_write_and_read_stacks() {
        let (pl, _dir) = open_layer();
        let past = vec![snap(&["a"]), snap(&["a", "b"])];
        let future = vec![snap(&["a", "b", "c"])];
        pl.write_stacks("h1", &past, &future).expect("write");

        assert_eq!(pl.read_stack("h1", Stack::Past).expect("read"), past);
        assert_eq!(pl.read_stack("h1", Stack::Future).expect("read"), future);
        assert_eq!(
            pl.load_meta("h1").expect("meta"),
            Some(HistoryMeta {
                past_len: 2,
                future_len: 1
            })
        );
    }

    #[test]
    fn test_rewrite_replaces_previous_entries() {
        let (pl, _dir) = open_layer();
        pl.write_stacks("h1", &[snap(&["a"]), snap(&["b"]), snap(&["c"])], &[snap(&["d"])])
            .expect("write");
        pl.write_stacks("h1", &[snap(&["x"])], &[]).expect("rewrite");

        assert_eq!(pl.count("h1", Stack::Past).expect("count"), 1);
        assert_eq!(pl.count("h1", Stack::Future).expect("count"), 0);
        assert_eq!(pl.read_stack("h1", Stack::Past).expect("read")[0], snap(&["x"]));
    }

    #[test]
    fn test_histories_are_independent() {
        let (pl, _dir) = open_layer();
        pl.write_stacks("h1", &[snap(&["a"])], &[]).expect("write h1");
        pl.write_stacks("h2", &[snap(&["b"]), snap(&["c"])], &[]).expect("write h2");

        pl.delete_history("h1").expect("delete");

        assert_eq!(pl.count("h1", Stack::Past).expect("count"), 0);
        assert!(pl.load_meta("h1").expect("meta").is_none());
        assert_eq!(pl.count("h2", Stack::Past).expect("count"), 2);
    }

    #[test]
    fn test_load_meta_missing() {
        let (pl, _dir) = open_layer();
        assert!(pl.load_meta("never-written").expect("meta").is_none());
        assert!(pl
            .read_stack("never-written", Stack::Past)
            .expect("read")
            .is_empty());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().expect("create temp dir");
        {
            let pl = PersistenceLayer::open(dir.path()).expect("open");
            pl.write_stacks("h", &[snap(&["keep"])], &[]).expect("write");
        }
        let pl = PersistenceLayer::open(dir.path()).expect("reopen");
        assert_eq!(pl.read_stack("h", Stack::Past).expect("read"), vec![snap(&["keep"])]);
    }
}
