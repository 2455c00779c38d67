/// Location of the application's own data (config, descriptions, backups, history).
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "ALIAS_MANAGER_DATA_DIR";

/// Resolves the data directory path.
///
/// Resolution order:
/// 1. `ALIAS_MANAGER_DATA_DIR` environment variable
/// 2. `alias-manager/` under the platform's local data directory
/// 3. `.data/` directory next to the executable
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join("alias-manager");
    }
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe.parent().unwrap_or(Path::new(".")).join(".data")
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~` (or when no home directory is known) are
/// returned unchanged.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
