/// Timestamped copies of the profile and the description document.
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::StorePaths;

const BACKUP_TAG: &str = ".backup_";

/// Files written by one backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub alias_file: PathBuf,
    /// `None` when there was no description document to copy.
    pub descriptions_file: Option<PathBuf>,
}

/// Copies the profile (and the description document, if present) into the
/// backups directory, stamped with the current local time.
pub fn create_backup(paths: &StorePaths) -> Result<BackupReport, StoreError> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    create_backup_at(paths, &stamp)
}

/// Same as [`create_backup`] with an explicit timestamp.
pub fn create_backup_at(paths: &StorePaths, stamp: &str) -> Result<BackupReport, StoreError> {
    let dir = &paths.backups_dir;
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let alias_name = file_label(&paths.alias_file, false);
    let alias_backup = unique_path(dir, &format!("{alias_name}{BACKUP_TAG}{stamp}"));
    std::fs::copy(&paths.alias_file, &alias_backup)
        .map_err(|e| StoreError::io(&paths.alias_file, e))?;
    tracing::info!("Backed up {} to {}", paths.alias_file.display(), alias_backup.display());

    let descriptions_file = if paths.descriptions_file.is_file() {
        let label = file_label(&paths.descriptions_file, true);
        let target = unique_path(dir, &format!("{label}{BACKUP_TAG}{stamp}"));
        std::fs::copy(&paths.descriptions_file, &target)
            .map_err(|e| StoreError::io(&paths.descriptions_file, e))?;
        tracing::info!(
            "Backed up {} to {}",
            paths.descriptions_file.display(),
            target.display()
        );
        Some(target)
    } else {
        tracing::debug!(
            "No description document at {}; skipping",
            paths.descriptions_file.display()
        );
        None
    };

    Ok(BackupReport {
        alias_file: alias_backup,
        descriptions_file,
    })
}

/// File name used in backup names: `.bashrc` becomes `bashrc`, and with
/// `stem_only` `alias_descriptions.json` becomes `alias_descriptions`.
fn file_label(path: &Path, stem_only: bool) -> String {
    let name = if stem_only {
        path.file_stem()
    } else {
        path.file_name()
    };
    let name = name.map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let trimmed = name.trim_start_matches('.');
    if trimmed.is_empty() {
        "aliases".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `dir/base`, or `dir/base_N` for the first free N.
fn unique_path(dir: &Path, base: &str) -> PathBuf {
    let candidate = dir.join(base);
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{base}_{n}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Timestamp part of a backup file name, used for ordering.
fn backup_stamp(name: &str) -> Option<&str> {
    name.rsplit_once(BACKUP_TAG).map(|(_, stamp)| stamp)
}

/// Backup files in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut backups: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if backup_stamp(&name).is_some() {
            backups.push((name, path));
        }
    }

    backups.sort_by(|(a, _), (b, _)| {
        backup_stamp(b)
            .cmp(&backup_stamp(a))
            .then_with(|| a.cmp(b))
    });
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &Path) -> StorePaths {
        StorePaths {
            alias_file: dir.join(".bashrc"),
            descriptions_file: dir.join("alias_descriptions.json"),
            backups_dir: dir.join("backups"),
        }
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("/home/u/.bashrc"), false), "bashrc");
        assert_eq!(
            file_label(Path::new("/d/alias_descriptions.json"), true),
            "alias_descriptions"
        );
        assert_eq!(file_label(Path::new("/home/u/.zshrc"), true), "zshrc");
    }

    #[test]
    fn test_backup_copies_both_files() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        std::fs::write(&paths.alias_file, "# CUSTOM ALIASES\n").unwrap();
        std::fs::write(&paths.descriptions_file, "{}").unwrap();

        let report = create_backup_at(&paths, "20260101_120000").unwrap();
        assert_eq!(
            report.alias_file,
            paths.backups_dir.join("bashrc.backup_20260101_120000")
        );
        assert_eq!(
            report.descriptions_file,
            Some(paths.backups_dir.join("alias_descriptions.backup_20260101_120000"))
        );
        assert_eq!(
            std::fs::read_to_string(&report.alias_file).unwrap(),
            "# CUSTOM ALIASES\n"
        );
    }

    #[test]
    fn test_backup_without_descriptions() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        std::fs::write(&paths.alias_file, "x").unwrap();
        let report = create_backup_at(&paths, "20260101_120000").unwrap();
        assert!(report.descriptions_file.is_none());
    }

    #[test]
    fn test_backup_missing_alias_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = create_backup_at(&paths(dir.path()), "20260101_120000").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_same_second_backups_get_suffix() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        std::fs::write(&paths.alias_file, "x").unwrap();
        let first = create_backup_at(&paths, "20260101_120000").unwrap();
        let second = create_backup_at(&paths, "20260101_120000").unwrap();
        assert_ne!(first.alias_file, second.alias_file);
        assert!(second
            .alias_file
            .to_string_lossy()
            .ends_with("bashrc.backup_20260101_120000_1"));
    }

    #[test]
    fn test_list_backups_newest_first() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        std::fs::write(&paths.alias_file, "x").unwrap();
        std::fs::write(&paths.descriptions_file, "{}").unwrap();
        create_backup_at(&paths, "20250101_000000").unwrap();
        create_backup_at(&paths, "20260101_000000").unwrap();
        std::fs::write(paths.backups_dir.join("notes.txt"), "ignored").unwrap();

        let listed = list_backups(&paths.backups_dir).unwrap();
        let names: Vec<String> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "alias_descriptions.backup_20260101_000000",
                "bashrc.backup_20260101_000000",
                "alias_descriptions.backup_20250101_000000",
                "bashrc.backup_20250101_000000",
            ]
        );
    }

    #[test]
    fn test_list_backups_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_backups(&dir.path().join("none")).unwrap().is_empty());
    }
}
