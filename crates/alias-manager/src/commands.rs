/// Subcommand handlers. Results go to stdout; diagnostics go through tracing.
use anyhow::{bail, Context, Result};

use alias_manager_config::SortColumn;
use alias_manager_core::{
    create_backup, default_export_path, list_backups, sort_aliases, AliasFilter, AliasRecord,
    ImportMode, Session, StoreError,
};

use crate::{Command, SectionAction, Settings};

pub(crate) fn run(command: Command, session: &mut Session, settings: &mut Settings) -> Result<()> {
    match command {
        Command::List {
            search,
            regex,
            case_sensitive,
            section,
            sort,
            desc,
            asc,
        } => {
            let filter = AliasFilter {
                query: search.unwrap_or_default(),
                section,
                use_regex: regex,
                case_sensitive,
            };
            let mut sort_by = settings.stored.list.sort_by;
            let mut ascending = settings.stored.list.ascending;
            if sort.is_some() || desc || asc {
                sort_by = sort.unwrap_or(sort_by);
                ascending = if desc { false } else if asc { true } else { ascending };
                settings.remember_sort(sort_by, ascending);
            }
            list(session, &filter, sort_by, ascending)
        }
        Command::Show { name } => show(session, &name),
        Command::Add {
            name,
            cmd,
            section,
            description,
        } => {
            let record = AliasRecord::new(name.as_str(), cmd, section, description);
            session.apply(|store| store.add_alias(record))?;
            println!("Added '{name}'.");
            Ok(())
        }
        Command::Edit {
            name,
            rename,
            cmd,
            section,
            description,
        } => {
            if rename.is_none() && cmd.is_none() && section.is_none() && description.is_none() {
                bail!("nothing to change: pass --rename, --command, --section or --description");
            }
            let current = session
                .store()
                .get(&name)
                .cloned()
                .ok_or_else(|| StoreError::UnknownAlias(name.clone()))?;
            let updated = AliasRecord {
                name: rename.unwrap_or(current.name),
                command: cmd.unwrap_or(current.command),
                section: section.unwrap_or(current.section),
                description: description.unwrap_or(current.description),
            };
            let new_name = updated.name.clone();
            session.apply(|store| store.update_alias(&name, updated))?;
            if new_name == name {
                println!("Updated '{name}'.");
            } else {
                println!("Updated '{name}' (now '{new_name}').");
            }
            Ok(())
        }
        Command::Remove { name } => {
            session.apply(|store| store.delete_alias(&name))?;
            println!("Removed '{name}'.");
            Ok(())
        }
        Command::Sections => {
            let store = session.store();
            for section in store.sections().sorted() {
                println!("{section} ({})", store.count_in_section(section));
            }
            Ok(())
        }
        Command::Section { action } => section(session, action),
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| default_export_path(&session.store().paths().backups_dir));
            let count = session.store().export_all(&path)?;
            println!("Exported {count} alias(es) to {}.", path.display());
            Ok(())
        }
        Command::Import { path, overwrite } => {
            let mode = if overwrite {
                ImportMode::Overwrite
            } else {
                ImportMode::Merge
            };
            let summary = session
                .apply(|store| store.import_all(&path, mode))
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!(
                "Imported {} new and {} updated alias(es), {} new section(s).",
                summary.added, summary.updated, summary.sections_added
            );
            Ok(())
        }
        Command::Backup => {
            let report = create_backup(session.store().paths())?;
            println!("{}", report.alias_file.display());
            if let Some(path) = report.descriptions_file {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Backups => {
            for path in list_backups(&session.store().paths().backups_dir)? {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Undo => {
            if session.undo()? {
                println!("Undone. {} more step(s) available.", session.undo_steps());
            } else {
                println!("Nothing to undo.");
            }
            Ok(())
        }
        Command::Redo => {
            if session.redo()? {
                println!("Redone. {} more step(s) available.", session.redo_steps());
            } else {
                println!("Nothing to redo.");
            }
            Ok(())
        }
        Command::History { clear } => {
            if clear {
                session.clear_history()?;
                println!("History cleared.");
                return Ok(());
            }
            println!("undo: {} step(s)", session.undo_steps());
            println!("redo: {} step(s)", session.redo_steps());
            Ok(())
        }
    }
}

fn list(
    session: &Session,
    filter: &AliasFilter,
    sort_by: SortColumn,
    ascending: bool,
) -> Result<()> {
    let mut rows = filter.apply(session.store().aliases())?;
    sort_aliases(&mut rows, sort_by, ascending);
    if rows.is_empty() {
        println!("No aliases.");
        return Ok(());
    }

    let name_w = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    let section_w = rows
        .iter()
        .map(|r| r.section.chars().count())
        .max()
        .unwrap_or(0);
    for row in rows {
        let line = format!(
            "{:<name_w$}  {:<section_w$}  {}",
            row.name, row.section, row.command
        );
        if row.description.is_empty() {
            println!("{}", line.trim_end());
        } else {
            println!("{line}  # {}", row.description);
        }
    }
    Ok(())
}

fn show(session: &Session, name: &str) -> Result<()> {
    let record = session
        .store()
        .get(name)
        .ok_or_else(|| StoreError::UnknownAlias(name.to_string()))?;
    println!("name:        {}", record.name);
    println!("command:     {}", record.command);
    println!("section:     {}", record.section);
    println!("description: {}", record.description);
    Ok(())
}

fn section(session: &mut Session, action: SectionAction) -> Result<()> {
    match action {
        SectionAction::Add { name } => {
            session.apply(|store| store.add_section(&name))?;
            println!("Added section '{name}'.");
        }
        SectionAction::Rename { old, new } => {
            session.apply(|store| store.rename_section(&old, &new))?;
            println!("Renamed section '{old}' to '{new}'.");
        }
        SectionAction::Remove { name } => {
            session.apply(|store| store.delete_section(&name))?;
            println!("Removed section '{name}'.");
        }
    }
    Ok(())
}
