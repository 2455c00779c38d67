/// Bounded linear undo/redo over full alias-collection snapshots.
///
/// Provides a `SnapshotHistory` that keeps a `past` and a `future` stack of
/// immutable snapshots in memory and can optionally mirror both stacks to an
/// embedded key-value store (redb) on disk, so history survives across
/// separate invocations of the application.
pub mod config;
pub mod manager;
pub mod persistence;
pub mod snapshot;

pub use config::HistoryConfig;
pub use manager::SnapshotHistory;
pub use persistence::{PersistenceLayer, Stack};
pub use snapshot::{Snapshot, SnapshotEntry};
