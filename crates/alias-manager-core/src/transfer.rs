/// JSON export and import of the whole alias collection.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::io::write_atomic;
use crate::model::AliasRecord;
use crate::store::AliasStore;

/// Prefix of export files written without an explicit destination.
const EXPORT_PREFIX: &str = "aliases_export_";

/// Portable form of the collection, independent of the profile format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportDocument {
    pub aliases: Vec<AliasRecord>,
    #[serde(default)]
    pub sections: Vec<String>,
}

impl ExportDocument {
    /// Captures the store's aliases and sections, sorted for stable output.
    pub fn from_store(store: &AliasStore) -> Self {
        let mut aliases = store.aliases().to_vec();
        aliases.sort_by(|a, b| a.section.cmp(&b.section).then_with(|| a.name.cmp(&b.name)));
        Self {
            aliases,
            sections: store.sections().sorted().into_iter().map(String::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|source| StoreError::Encode {
            what: "export document",
            source,
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Reads a document written by `export_all` (or an older version of it).
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// What happens to the current collection on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing aliases; add new ones and replace those with a matching name.
    #[default]
    Merge,
    /// Drop every alias, section and description first.
    Overwrite,
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub sections_added: usize,
}

/// Default destination for an export: a timestamped file in `backups_dir`.
pub fn default_export_path(backups_dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    backups_dir.join(format!("{EXPORT_PREFIX}{stamp}.json"))
}

impl AliasStore {
    /// Writes the whole collection to `path` as JSON. Returns the alias count.
    pub fn export_all(&self, path: &Path) -> Result<usize, StoreError> {
        let document = ExportDocument::from_store(self);
        write_atomic(path, document.to_json()?.as_bytes())?;
        tracing::info!(
            "Exported {} alias(es) to {}",
            document.aliases.len(),
            path.display()
        );
        Ok(document.aliases.len())
    }

    /// Reads an export document from `path` and applies it.
    pub fn import_all(&mut self, path: &Path, mode: ImportMode) -> Result<ImportSummary, StoreError> {
        let document = ExportDocument::read(path)?;
        let summary = self.import_document(document, mode)?;
        tracing::info!(
            "Imported {} new and {} updated alias(es) from {}",
            summary.added,
            summary.updated,
            path.display()
        );
        Ok(summary)
    }

    /// Applies `document` to the collection and writes the result.
    ///
    /// Every record is checked first; a single invalid record rejects the
    /// whole import. A name repeated inside the document resolves to its
    /// last occurrence.
    pub fn import_document(
        &mut self,
        document: ExportDocument,
        mode: ImportMode,
    ) -> Result<ImportSummary, StoreError> {
        for section in &document.sections {
            self.check_section(section)?;
        }
        for record in &document.aliases {
            self.check_record(record)?;
        }

        let mut next = self.model().clone();
        if mode == ImportMode::Overwrite {
            next.aliases.clear();
            next.sections.clear();
            next.descriptions.clear();
        }

        let mut summary = ImportSummary::default();
        for section in document.sections {
            if next.sections.insert(section) {
                summary.sections_added += 1;
            }
        }
        for record in document.aliases {
            if !record.section.is_empty() && !next.sections.contains(&record.section) {
                summary.sections_added += 1;
            }
            if next.position(&record.name).is_some() {
                summary.updated += 1;
            } else {
                summary.added += 1;
            }
            next.upsert(record);
        }

        self.commit(next)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_alias_key_accepted() {
        let json = r#"{
            "aliases": [
                {"alias": "gs", "command": "git status", "section": "git"}
            ]
        }"#;
        let document: ExportDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.aliases[0].name, "gs");
        assert_eq!(document.aliases[0].description, "");
        assert!(document.sections.is_empty());
    }

    #[test]
    fn test_export_json_shape() {
        let document = ExportDocument {
            aliases: vec![AliasRecord::new("gs", "git status", "git", "Status")],
            sections: vec!["git".to_string()],
        };
        let json = document.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["aliases"][0]["name"], "gs");
        assert_eq!(value["aliases"][0]["description"], "Status");
        assert_eq!(value["sections"][0], "git");
    }

    #[test]
    fn test_default_export_path() {
        let path = default_export_path(Path::new("/backups"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("aliases_export_"));
        assert!(name.ends_with(".json"));
        // aliases_export_YYYYmmdd_HHMMSS.json
        assert_eq!(name.len(), "aliases_export_".len() + 15 + ".json".len());
        assert_eq!(path.parent(), Some(Path::new("/backups")));
    }
}
