/// Application configuration: load, save, and sanitize.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::paths::expand_home;

/// Default sentinel line that opens the managed alias region.
pub const DEFAULT_MARKER: &str = "# CUSTOM ALIASES";

/// Default prefix of comment lines that are sub-items, not section headers.
pub const DEFAULT_SUB_ITEM_PREFIX: &str = "# ↓";

/// Default number of snapshots kept for undo.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Upper bound accepted for `history_capacity`.
const MAX_HISTORY_CAPACITY: usize = 500;

/// File name of the config document inside the data directory.
const CONFIG_FILE_NAME: &str = "alias-manager.json";

/// Column used to order the alias listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Name,
    Command,
    Section,
    Description,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [
        SortColumn::Name,
        SortColumn::Command,
        SortColumn::Section,
        SortColumn::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Command => "command",
            SortColumn::Section => "section",
            SortColumn::Description => "description",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        // "alias" is what older settings files called the name column
        if lowered == "alias" {
            return Ok(SortColumn::Name);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| {
                format!("unknown sort column '{s}' (expected name, command, section or description)")
            })
    }
}

/// Persisted preferences for the alias listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    pub sort_by: SortColumn,
    pub ascending: bool,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            sort_by: SortColumn::Name,
            ascending: true,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shell profile holding the managed aliases. Empty = `~/.bashrc`.
    pub alias_file: String,
    /// JSON document with alias descriptions. Empty = `<data dir>/alias_descriptions.json`.
    pub descriptions_file: String,
    /// Directory for backups and default exports. Empty = `<data dir>/backups`.
    pub backups_dir: String,
    /// Sentinel line that opens the managed region.
    pub marker: String,
    /// Comment prefix that is never treated as a section header.
    pub sub_item_prefix: String,
    /// Number of snapshots kept for undo (1..=500).
    pub history_capacity: usize,
    pub list: ListSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alias_file: String::new(),
            descriptions_file: String::new(),
            backups_dir: String::new(),
            marker: DEFAULT_MARKER.to_string(),
            sub_item_prefix: DEFAULT_SUB_ITEM_PREFIX.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            list: ListSettings::default(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path inside `data_dir`.
    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            let mut config = Self::default();
            config.sanitize();
            config
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        if self.marker.trim().is_empty() {
            self.marker = DEFAULT_MARKER.to_string();
        } else {
            self.marker = self.marker.trim().to_string();
        }
        if self.sub_item_prefix.trim().is_empty() {
            self.sub_item_prefix = DEFAULT_SUB_ITEM_PREFIX.to_string();
        }
        self.history_capacity = self.history_capacity.clamp(1, MAX_HISTORY_CAPACITY);
    }

    /// Returns the shell profile to manage.
    ///
    /// Falls back to `~/.bashrc` when `alias_file` is empty.
    pub fn alias_file_path(&self) -> PathBuf {
        if self.alias_file.trim().is_empty() {
            return dirs::home_dir()
                .map(|home| home.join(".bashrc"))
                .unwrap_or_else(|| PathBuf::from(".bashrc"));
        }
        expand_home(self.alias_file.trim())
    }

    /// Returns the description document path, defaulting into `data_dir`.
    pub fn descriptions_file_path(&self, data_dir: &Path) -> PathBuf {
        if self.descriptions_file.trim().is_empty() {
            return data_dir.join("alias_descriptions.json");
        }
        expand_home(self.descriptions_file.trim())
    }

    /// Returns the backups directory, defaulting into `data_dir`.
    pub fn backups_dir_path(&self, data_dir: &Path) -> PathBuf {
        if self.backups_dir.trim().is_empty() {
            return data_dir.join("backups");
        }
        expand_home(self.backups_dir.trim())
    }
}
