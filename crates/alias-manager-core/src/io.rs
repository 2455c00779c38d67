use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Resolves a symlinked target so writes land on the real file.
fn write_target(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("alias-manager"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomic write: write a sibling `.tmp` file, then rename it over `path`.
///
/// Parent directories are created. Permissions of an existing target carry
/// over to the new file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let target = write_target(path);
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }

    let tmp = temp_sibling(&target);
    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::io(&target, e));
    }
    if let Ok(meta) = fs::metadata(&target) {
        if let Err(e) = fs::set_permissions(&tmp, meta.permissions()) {
            tracing::debug!("Could not copy permissions onto {}: {e}", tmp.display());
        }
    }
    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::io(&target, e));
    }
    Ok(())
}

/// Writes each `(path, contents)` pair in order with [`write_atomic`].
///
/// If a write fails, the files already written by this call get their
/// previous contents back, or are removed if they did not exist.
pub(crate) fn write_all_atomic(writes: &[(&Path, &[u8])]) -> Result<(), StoreError> {
    let mut originals = Vec::with_capacity(writes.len());
    for (path, _) in writes {
        let original = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io(*path, e)),
        };
        originals.push(original);
    }

    for (done, (path, contents)) in writes.iter().enumerate() {
        if let Err(e) = write_atomic(path, contents) {
            for i in (0..done).rev() {
                let written = writes[i].0;
                let restored = match &originals[i] {
                    Some(bytes) => write_atomic(written, bytes),
                    None => fs::remove_file(written).map_err(|e| StoreError::io(written, e)),
                };
                if let Err(restore) = restored {
                    tracing::error!(
                        "Failed to restore {} after a failed write: {restore}",
                        written.display()
                    );
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".bashrc");
        write_atomic(&path, b"hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!dir.path().join("nested").join(".bashrc.tmp").exists());
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_write_all_rolls_back_on_failure() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("existing");
        let created = dir.path().join("created");
        fs::write(&existing, "old").unwrap();
        fs::write(dir.path().join("blocker"), "").unwrap();
        let unwritable = dir.path().join("blocker").join("file");

        let result = write_all_atomic(&[
            (existing.as_path(), b"new".as_slice()),
            (created.as_path(), b"x".as_slice()),
            (unwritable.as_path(), b"y".as_slice()),
        ]);
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "old");
        assert!(!created.exists());
    }

    #[test]
    fn test_write_all_writes_every_file() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("sub").join("b");
        write_all_atomic(&[(a.as_path(), b"1".as_slice()), (b.as_path(), b"2".as_slice())])
            .unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "1");
        assert_eq!(fs::read_to_string(&b).unwrap(), "2");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink_keeps_link() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real_profile");
        let link = dir.path().join("profile_link");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"new").unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_atomic(&path, b"new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
