/// Failures and soft diagnostics reported by the store.
use std::path::PathBuf;

use thiserror::Error;

/// A store operation that could not be carried out.
///
/// Every variant leaves both the in-memory model and the files on disk as
/// they were before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("marker line '{marker}' not found in {}", .path.display())]
    MarkerNotFound { path: PathBuf, marker: String },

    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("alias '{0}' already exists")]
    DuplicateAlias(String),

    #[error("alias '{0}' does not exist")]
    UnknownAlias(String),

    #[error("section '{0}' already exists")]
    SectionExists(String),

    #[error("section '{0}' does not exist")]
    UnknownSection(String),

    #[error("section '{name}' still holds {count} alias(es)")]
    SectionNotEmpty { name: String, count: usize },

    #[error("invalid alias: {0}")]
    InvalidAlias(String),

    #[error("invalid search pattern")]
    InvalidPattern(#[from] regex::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is a rejected request rather than an I/O problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateAlias(_)
                | StoreError::UnknownAlias(_)
                | StoreError::SectionExists(_)
                | StoreError::UnknownSection(_)
                | StoreError::SectionNotEmpty { .. }
                | StoreError::InvalidAlias(_)
                | StoreError::InvalidPattern(_)
        )
    }
}

/// A recoverable problem met while loading; the store fell back to empty data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    #[error("alias file {} does not exist", .0.display())]
    AliasFileMissing(PathBuf),

    #[error("could not read alias file {}: {reason}", .path.display())]
    AliasFileUnreadable { path: PathBuf, reason: String },

    #[error("marker line '{marker}' not found in {}; no aliases are managed", .path.display())]
    MarkerMissing { path: PathBuf, marker: String },

    #[error("description document {} is unreadable, starting empty: {reason}", .path.display())]
    DescriptionsUnreadable { path: PathBuf, reason: String },

    #[error("section list {} is unreadable, keeping only sections in use: {reason}", .path.display())]
    SectionsUnreadable { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(StoreError::DuplicateAlias("gs".into()).is_validation());
        assert!(StoreError::SectionNotEmpty {
            name: "git".into(),
            count: 2
        }
        .is_validation());
        assert!(!StoreError::MarkerNotFound {
            path: PathBuf::from("x"),
            marker: "# CUSTOM ALIASES".into()
        }
        .is_validation());
        assert!(!StoreError::io("x", std::io::Error::other("boom")).is_validation());
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = StoreError::SectionNotEmpty {
            name: "git".into(),
            count: 2,
        };
        assert_eq!(err.to_string(), "section 'git' still holds 2 alias(es)");

        let warning = LoadWarning::AliasFileMissing(PathBuf::from("/tmp/none"));
        assert_eq!(warning.to_string(), "alias file /tmp/none does not exist");
    }
}
