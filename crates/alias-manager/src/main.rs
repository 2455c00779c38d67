use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use alias_manager_config::{resolve_data_dir, AppConfig, SortColumn};
use alias_manager_core::{Session, StoreError};

mod commands;

/// Manage shell aliases kept in a marked region of your shell profile.
#[derive(Parser, Debug)]
#[command(name = "alias-manager", version, about)]
struct Cli {
    /// Config file to use instead of the one in the data directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Shell profile to manage (overrides the config for this run).
    #[arg(long, global = true, value_name = "PATH")]
    alias_file: Option<PathBuf>,

    /// Description document (overrides the config for this run).
    #[arg(long, global = true, value_name = "PATH")]
    descriptions: Option<PathBuf>,

    /// Backups directory (overrides the config for this run).
    #[arg(long, global = true, value_name = "PATH")]
    backups_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List aliases, optionally filtered and sorted.
    List {
        /// Text to look for in name, command or description.
        #[arg(long, short)]
        search: Option<String>,
        /// Treat the search text as a regular expression.
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        case_sensitive: bool,
        /// Only show aliases in this section.
        #[arg(long)]
        section: Option<String>,
        /// Column to sort by (name, command, section, description). Saved as the default.
        #[arg(long)]
        sort: Option<SortColumn>,
        /// Sort descending. Saved as the default.
        #[arg(long, conflicts_with = "asc")]
        desc: bool,
        /// Sort ascending. Saved as the default.
        #[arg(long)]
        asc: bool,
    },
    /// Show every field of one alias.
    Show { name: String },
    /// Add an alias.
    Add {
        name: String,
        #[arg(value_name = "COMMAND")]
        cmd: String,
        #[arg(long)]
        section: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change an alias.
    Edit {
        name: String,
        /// New name.
        #[arg(long)]
        rename: Option<String>,
        #[arg(long = "command", value_name = "COMMAND")]
        cmd: Option<String>,
        #[arg(long)]
        section: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove an alias.
    Remove { name: String },
    /// List sections with their alias counts.
    Sections,
    /// Add, rename or remove a section.
    Section {
        #[command(subcommand)]
        action: SectionAction,
    },
    /// Export all aliases to a JSON document.
    Export {
        /// Destination. Defaults to a timestamped file in the backups directory.
        path: Option<PathBuf>,
    },
    /// Import aliases from a JSON document.
    Import {
        path: PathBuf,
        /// Replace the whole collection instead of merging into it.
        #[arg(long)]
        overwrite: bool,
    },
    /// Back up the profile and the description document.
    Backup,
    /// List existing backups, newest first.
    Backups,
    /// Undo the last change.
    Undo,
    /// Redo the last undone change.
    Redo,
    /// Show how many undo and redo steps are available.
    History {
        /// Forget every undo and redo step, keeping the current state.
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SectionAction {
    Add { name: String },
    Rename { old: String, new: String },
    Remove { name: String },
}

/// Config as loaded from disk plus the per-run overrides.
struct Settings {
    data_dir: PathBuf,
    config_path: PathBuf,
    /// What is on disk; preference changes are saved from this copy.
    stored: AppConfig,
    effective: AppConfig,
}

impl Settings {
    fn load(cli: &Cli) -> Self {
        let data_dir = resolve_data_dir();
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| AppConfig::config_path(&data_dir));
        let stored = AppConfig::load_or_create(&config_path);

        let mut effective = stored.clone();
        if let Some(path) = &cli.alias_file {
            effective.alias_file = path.to_string_lossy().into_owned();
        }
        if let Some(path) = &cli.descriptions {
            effective.descriptions_file = path.to_string_lossy().into_owned();
        }
        if let Some(path) = &cli.backups_dir {
            effective.backups_dir = path.to_string_lossy().into_owned();
        }

        Self {
            data_dir,
            config_path,
            stored,
            effective,
        }
    }

    /// Saves the listing preferences if they changed.
    fn remember_sort(&mut self, sort_by: SortColumn, ascending: bool) {
        if self.stored.list.sort_by == sort_by && self.stored.list.ascending == ascending {
            return;
        }
        self.stored.list.sort_by = sort_by;
        self.stored.list.ascending = ascending;
        if let Err(e) = self.stored.save(&self.config_path) {
            tracing::warn!(
                "Failed to save list preferences to {}: {e}",
                self.config_path.display()
            );
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut settings = Settings::load(&cli);
    tracing::debug!("Using data directory {}", settings.data_dir.display());

    let (mut session, warnings) = Session::open(&settings.effective, &settings.data_dir);
    tracing::debug!("Opened store with {} load warning(s)", warnings.len());

    let outcome = commands::run(cli.command, &mut session, &mut settings);

    if let Err(e) = session.flush() {
        tracing::warn!("Failed to save undo history: {e:#}");
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Rejected requests get a one-line message and exit code 2
        Err(e) if e.downcast_ref::<StoreError>().is_some_and(StoreError::is_validation) => {
            eprintln!("error: {e:#}");
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e),
    }
}
