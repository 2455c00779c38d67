/// Alias persistence, editing, and undo/redo.
/// `AliasStore` owns the in-memory alias collection and is the only type that
/// touches the shell profile and the files kept beside it. `Session` pairs a
/// store with a `SnapshotHistory` so every mutation can be undone.
pub mod alias_file;
pub mod backup;
pub mod descriptions;
pub mod error;
pub mod filter;
pub mod history;
mod io;
pub mod model;
pub mod session;
pub mod store;
pub mod transfer;

pub use alias_file::AliasFileFormat;
pub use backup::{create_backup, create_backup_at, list_backups, BackupReport};
pub use descriptions::DescriptionIndex;
pub use error::{LoadWarning, StoreError};
pub use filter::{sort_aliases, AliasFilter, CompiledFilter};
pub use model::{AliasRecord, SectionSet};
pub use session::Session;
pub use store::{AliasStore, StorePaths};
pub use transfer::{default_export_path, ExportDocument, ImportMode, ImportSummary};
