/// The alias store: single owner of the alias collection and its files.
/// Every mutation is staged on a copy of the model, rendered and serialized
/// in memory, written atomically, and only then swapped in. A failed call
/// leaves both memory and disk as they were.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use alias_manager_config::AppConfig;
use alias_manager_mod_history::Snapshot;

use crate::alias_file::{self, AliasFileFormat};
use crate::descriptions::DescriptionIndex;
use crate::error::{LoadWarning, StoreError};
use crate::io::write_all_atomic;
use crate::model::{validate_section_name, AliasRecord, SectionSet};

/// Files the store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Shell profile holding the managed region.
    pub alias_file: PathBuf,
    /// JSON description document.
    pub descriptions_file: PathBuf,
    /// Destination for backups and default exports.
    pub backups_dir: PathBuf,
}

impl StorePaths {
    /// Resolves all paths from the application config.
    pub fn from_config(config: &AppConfig, data_dir: &Path) -> Self {
        Self {
            alias_file: config.alias_file_path(),
            descriptions_file: config.descriptions_file_path(data_dir),
            backups_dir: config.backups_dir_path(data_dir),
        }
    }

    /// Section list kept beside the description document, e.g.
    /// `alias_descriptions.sections.json`.
    pub fn sections_file(&self) -> PathBuf {
        let mut name = self
            .descriptions_file
            .file_stem()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("alias_descriptions"));
        name.push(".sections.json");
        self.descriptions_file.with_file_name(name)
    }
}

/// Everything a mutation may change, cloned as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Model {
    pub(crate) aliases: Vec<AliasRecord>,
    pub(crate) sections: SectionSet,
    pub(crate) descriptions: DescriptionIndex,
}

impl Model {
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.aliases.iter().position(|a| a.name == name)
    }

    /// Adds or replaces `record`, keeping sections and descriptions in step.
    pub(crate) fn upsert(&mut self, record: AliasRecord) {
        if !record.section.is_empty() {
            self.sections.insert(record.section.as_str());
        }
        self.descriptions.set(&record.name, &record.description);
        match self.position(&record.name) {
            Some(idx) => self.aliases[idx] = record,
            None => self.aliases.push(record),
        }
    }
}

/// Single source of truth for aliases, sections and descriptions.
#[derive(Debug, Clone)]
pub struct AliasStore {
    paths: StorePaths,
    format: AliasFileFormat,
    model: Model,
}

impl AliasStore {
    /// Creates an empty store over `paths` without touching the disk.
    pub fn new(paths: StorePaths, format: AliasFileFormat) -> Self {
        Self {
            paths,
            format,
            model: Model::default(),
        }
    }

    /// Creates a store and loads it, returning any load warnings.
    pub fn open(paths: StorePaths, format: AliasFileFormat) -> (Self, Vec<LoadWarning>) {
        let mut store = Self::new(paths, format);
        let warnings = store.load();
        (store, warnings)
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn format(&self) -> &AliasFileFormat {
        &self.format
    }

    /// Aliases in load/insertion order.
    pub fn aliases(&self) -> &[AliasRecord] {
        &self.model.aliases
    }

    pub fn sections(&self) -> &SectionSet {
        &self.model.sections
    }

    pub fn descriptions(&self) -> &DescriptionIndex {
        &self.model.descriptions
    }

    pub fn get(&self, name: &str) -> Option<&AliasRecord> {
        self.model.aliases.iter().find(|a| a.name == name)
    }

    /// Number of aliases filed under `section`.
    pub fn count_in_section(&self, section: &str) -> usize {
        self.model
            .aliases
            .iter()
            .filter(|a| a.section == section)
            .count()
    }

    // ── Loading ────────────────────────────────────────────────────────

    /// Reads the profile, the description document and the section list into
    /// memory.
    ///
    /// Never fails: a missing or unusable file yields an empty collection
    /// and a warning. When the profile defines the same alias twice, the
    /// later definition wins, as it would in the shell. Sections from the
    /// section list are added to those found in the profile.
    pub fn load(&mut self) -> Vec<LoadWarning> {
        let mut warnings = Vec::new();
        let (descriptions, warning) = DescriptionIndex::load(&self.paths.descriptions_file);
        warnings.extend(warning);

        let (saved_sections, warning) = SectionSet::load(&self.paths.sections_file());
        warnings.extend(warning);

        let mut model = Model {
            descriptions,
            ..Model::default()
        };

        let path = &self.paths.alias_file;
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let parsed = alias_file::parse(&text, &self.format);
                if !parsed.marker_found {
                    tracing::warn!("Marker '{}' not found in {}", self.format.marker, path.display());
                    warnings.push(LoadWarning::MarkerMissing {
                        path: path.clone(),
                        marker: self.format.marker.clone(),
                    });
                }
                model.sections = SectionSet::from_names(parsed.sections);
                for alias in parsed.aliases {
                    if model.position(&alias.name).is_some() {
                        tracing::debug!("Alias '{}' defined more than once; keeping the last", alias.name);
                    }
                    let description = model
                        .descriptions
                        .get(&alias.name)
                        .unwrap_or_default()
                        .to_string();
                    let record = AliasRecord::new(alias.name, alias.command, alias.section, description);
                    if !record.section.is_empty() {
                        model.sections.insert(record.section.as_str());
                    }
                    match model.position(&record.name) {
                        Some(idx) => model.aliases[idx] = record,
                        None => model.aliases.push(record),
                    }
                }
                tracing::debug!(
                    "Loaded {} alias(es) in {} section(s) from {}",
                    model.aliases.len(),
                    model.sections.len(),
                    path.display()
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Alias file {} does not exist", path.display());
                warnings.push(LoadWarning::AliasFileMissing(path.clone()));
            }
            Err(e) => {
                tracing::warn!("Failed to read alias file {}: {e}", path.display());
                warnings.push(LoadWarning::AliasFileUnreadable {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }

        for name in saved_sections.iter() {
            model.sections.insert(name);
        }

        self.model = model;
        warnings
    }

    /// Re-reads the description document and refreshes every alias's
    /// description from it.
    pub fn load_descriptions(&mut self) -> Option<LoadWarning> {
        let (descriptions, warning) = DescriptionIndex::load(&self.paths.descriptions_file);
        for alias in &mut self.model.aliases {
            alias.description = descriptions.get(&alias.name).unwrap_or_default().to_string();
        }
        self.model.descriptions = descriptions;
        warning
    }

    /// Writes the description document.
    pub fn save_descriptions(&self) -> Result<(), StoreError> {
        self.model.descriptions.save(&self.paths.descriptions_file)
    }

    // ── Writing ────────────────────────────────────────────────────────

    /// Rewrites the managed region, the description document and the section
    /// list from the current model.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        self.commit(self.model.clone())
    }

    fn read_alias_text(&self) -> Result<String, StoreError> {
        std::fs::read_to_string(&self.paths.alias_file)
            .map_err(|e| StoreError::io(&self.paths.alias_file, e))
    }

    /// Writes `next` to disk and, on success, makes it the live model.
    ///
    /// All three documents are produced before any file is written. If a
    /// later write fails, the files already replaced get their previous
    /// contents back.
    pub(crate) fn commit(&mut self, next: Model) -> Result<(), StoreError> {
        let original = self.read_alias_text()?;
        let rendered = alias_file::render(&original, &self.format, &next.aliases).ok_or_else(
            || StoreError::MarkerNotFound {
                path: self.paths.alias_file.clone(),
                marker: self.format.marker.clone(),
            },
        )?;
        let descriptions = next.descriptions.to_json()?;
        let sections = next.sections.to_json()?;
        let sections_file = self.paths.sections_file();

        write_all_atomic(&[
            (self.paths.alias_file.as_path(), rendered.as_bytes()),
            (self.paths.descriptions_file.as_path(), descriptions.as_bytes()),
            (sections_file.as_path(), sections.as_bytes()),
        ])?;

        tracing::info!(
            "Saved {} alias(es) to {}",
            next.aliases.len(),
            self.paths.alias_file.display()
        );
        self.model = next;
        Ok(())
    }

    pub(crate) fn model(&self) -> &Model {
        &self.model
    }

    /// Validates a record for writing under this store's line format.
    pub(crate) fn check_record(&self, record: &AliasRecord) -> Result<(), StoreError> {
        record.validate()?;
        if record.section.is_empty() {
            return Ok(());
        }
        self.check_section_header(&record.section)
    }

    fn check_section_header(&self, section: &str) -> Result<(), StoreError> {
        if self.format.is_writable_section(section) {
            Ok(())
        } else {
            Err(StoreError::InvalidAlias(format!(
                "section '{section}' would not read back as a section header"
            )))
        }
    }

    pub(crate) fn check_section(&self, name: &str) -> Result<(), StoreError> {
        validate_section_name(name)?;
        self.check_section_header(name)
    }

    // ── Alias CRUD ─────────────────────────────────────────────────────

    /// Adds a new alias. Its section is created if needed.
    pub fn add_alias(&mut self, record: AliasRecord) -> Result<(), StoreError> {
        self.check_record(&record)?;
        if self.model.position(&record.name).is_some() {
            return Err(StoreError::DuplicateAlias(record.name));
        }
        let mut next = self.model.clone();
        next.upsert(record);
        self.commit(next)
    }

    /// Replaces the alias called `old_name` with `record`, which may carry a
    /// new name. The description moves with the alias.
    pub fn update_alias(&mut self, old_name: &str, record: AliasRecord) -> Result<(), StoreError> {
        self.check_record(&record)?;
        let idx = self
            .model
            .position(old_name)
            .ok_or_else(|| StoreError::UnknownAlias(old_name.to_string()))?;
        if record.name != old_name && self.model.position(&record.name).is_some() {
            return Err(StoreError::DuplicateAlias(record.name));
        }

        let mut next = self.model.clone();
        next.descriptions.rename(old_name, &record.name);
        next.descriptions.set(&record.name, &record.description);
        if !record.section.is_empty() {
            next.sections.insert(record.section.as_str());
        }
        next.aliases[idx] = record;
        self.commit(next)
    }

    /// Deletes an alias and its description, returning the removed record.
    pub fn delete_alias(&mut self, name: &str) -> Result<AliasRecord, StoreError> {
        let idx = self
            .model
            .position(name)
            .ok_or_else(|| StoreError::UnknownAlias(name.to_string()))?;
        let mut next = self.model.clone();
        let removed = next.aliases.remove(idx);
        next.descriptions.remove(name);
        self.commit(next)?;
        Ok(removed)
    }

    // ── Section CRUD ───────────────────────────────────────────────────

    pub fn add_section(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_section(name)?;
        if self.model.sections.contains(name) {
            return Err(StoreError::SectionExists(name.to_string()));
        }
        let mut next = self.model.clone();
        next.sections.insert(name);
        self.commit(next)
    }

    /// Renames a section and moves every alias in it along.
    ///
    /// Renaming a section to its own name succeeds without writing.
    pub fn rename_section(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        if !self.model.sections.contains(old) {
            return Err(StoreError::UnknownSection(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        self.check_section(new)?;
        if self.model.sections.contains(new) {
            return Err(StoreError::SectionExists(new.to_string()));
        }

        let mut next = self.model.clone();
        next.sections.rename(old, new);
        for alias in next.aliases.iter_mut().filter(|a| a.section == old) {
            alias.section = new.to_string();
        }
        self.commit(next)
    }

    /// Deletes a section that no alias belongs to.
    pub fn delete_section(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.model.sections.contains(name) {
            return Err(StoreError::UnknownSection(name.to_string()));
        }
        let count = self.count_in_section(name);
        if count > 0 {
            return Err(StoreError::SectionNotEmpty {
                name: name.to_string(),
                count,
            });
        }
        let mut next = self.model.clone();
        next.sections.remove(name);
        self.commit(next)
    }

    // ── Snapshots ──────────────────────────────────────────────────────

    /// Deep copy of the current aliases and sections.
    ///
    /// The copy is canonical: aliases ordered by section then name, sections
    /// by name. Two stores holding the same collection give equal snapshots
    /// whatever order their aliases were added or loaded in.
    pub fn snapshot(&self) -> Snapshot {
        let mut aliases: Vec<_> = self
            .model
            .aliases
            .iter()
            .map(AliasRecord::to_snapshot_entry)
            .collect();
        aliases.sort_by(|a, b| (&a.section, &a.name).cmp(&(&b.section, &b.name)));
        let sections = self
            .model
            .sections
            .sorted()
            .into_iter()
            .map(str::to_string)
            .collect();
        Snapshot::new(aliases, sections)
    }

    /// Replaces the collection with `snapshot` and writes it out.
    ///
    /// Description entries are rewritten for restored aliases and pruned for
    /// aliases the snapshot does not contain.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), StoreError> {
        let (entries, sections) = snapshot.into_parts();
        let aliases: Vec<AliasRecord> = entries.into_iter().map(AliasRecord::from).collect();

        let mut descriptions = self.model.descriptions.clone();
        descriptions.retain(|name| aliases.iter().any(|a| a.name == name));
        for alias in &aliases {
            descriptions.set(&alias.name, &alias.description);
        }

        let next = Model {
            aliases,
            sections: SectionSet::from_names(sections),
            descriptions,
        };
        self.commit(next)
    }
}
