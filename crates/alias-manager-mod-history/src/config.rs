/// Configuration and utility functions for the history system.
use std::path::{Path, PathBuf};

use alias_manager_config::{resolve_data_dir, DEFAULT_HISTORY_CAPACITY};

/// Configuration for the history system.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Max snapshots kept on the `past` stack. Oldest are evicted first.
    pub capacity: usize,
    /// Root directory for the persistence database.
    pub data_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            data_dir: resolve_data_dir().join("history"),
        }
    }
}

impl HistoryConfig {
    /// Builds a config with the given capacity under `data_dir/history`.
    pub fn with_capacity(capacity: usize, data_dir: &Path) -> Self {
        Self {
            capacity: capacity.max(1),
            data_dir: data_dir.join("history"),
        }
    }
}

/// Generates a history ID for an alias file on disk.
///
/// Uses a hash of the canonical path for stability across sessions, so two
/// different shell profiles never share an undo trail.
pub fn history_id_for_path(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("aliases-{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let config = HistoryConfig::default();
        assert_eq!(config.capacity, 30);
        assert!(config.data_dir.ends_with("history"));
    }

    #[test]
    fn test_with_capacity_never_zero() {
        let config = HistoryConfig::with_capacity(0, Path::new("/data"));
        assert_eq!(config.capacity, 1);
        assert_eq!(config.data_dir, PathBuf::from("/data/history"));
    }

    #[test]
    fn test_history_id_for_path_consistent() {
        let path = PathBuf::from("test_bashrc");
        let id1 = history_id_for_path(&path);
        let id2 = history_id_for_path(&path);
        assert_eq!(id1, id2);
        assert!(id1.starts_with("aliases-"));
    }

    #[test]
    fn test_history_id_for_different_paths_differ() {
        let id1 = history_id_for_path(Path::new("profile_a"));
        let id2 = history_id_for_path(Path::new("profile_b"));
        assert_ne!(id1, id2);
    }
}
