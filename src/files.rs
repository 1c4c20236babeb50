//! Canonical file naming and best-effort rename/move of source PDFs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use tracing::{info, warn};

use crate::model::{DocumentDate, DocumentRecord};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum NamingStyle {
    /// `<number>-<YYYY-MM-DD>.pdf`
    NumberAndDate,
    /// `<number>.pdf`
    NumberOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    AlreadyCanonical,
    Skipped(&'static str),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: PathBuf, to: PathBuf },
    Failed(String),
}

/// Keeps ASCII letters and digits only: `1.002/2024` becomes `10022024`.
pub fn clean_number(number: &str) -> String {
    number
        .chars()
        .filter(|character| character.is_ascii_alphanumeric())
        .collect()
}

pub fn canonical_filename(number: &str, date: Option<&DocumentDate>) -> String {
    let cleaned = clean_number(number);
    match date {
        Some(date) => format!("{cleaned}-{date}.pdf"),
        None => format!("{cleaned}.pdf"),
    }
}

/// Target name for `record`, or the reason it cannot be named yet.
pub fn target_filename(
    record: &DocumentRecord,
    style: NamingStyle,
) -> std::result::Result<String, &'static str> {
    let number = record
        .effective_number()
        .filter(|number| !clean_number(number).is_empty())
        .ok_or("number missing")?;

    match style {
        NamingStyle::NumberAndDate if record.date.is_unknown() => Err("date unknown"),
        NamingStyle::NumberAndDate => Ok(canonical_filename(&number, Some(&record.date))),
        NamingStyle::NumberOnly => Ok(canonical_filename(&number, None)),
    }
}

/// Renames the record's file in place. On success `source_path` follows the file;
/// on any failure the record keeps its original path.
pub fn rename_to_canonical(record: &mut DocumentRecord, style: NamingStyle) -> RenameOutcome {
    let filename = match target_filename(record, style) {
        Ok(filename) => filename,
        Err(reason) => return RenameOutcome::Skipped(reason),
    };

    let from = record.source_path.clone();
    let to = from
        .parent()
        .map(|parent| parent.join(&filename))
        .unwrap_or_else(|| PathBuf::from(&filename));

    if from == to {
        return RenameOutcome::AlreadyCanonical;
    }

    match rename_without_overwrite(&from, &to) {
        Ok(()) => {
            info!(from = %from.display(), to = %to.display(), "renamed file");
            record.source_path = to.clone();
            RenameOutcome::Renamed { from, to }
        }
        Err(error) => {
            warn!(path = %from.display(), error = %format!("{error:#}"), "rename failed");
            RenameOutcome::Failed(format!("{error:#}"))
        }
    }
}

/// Moves the record's file into `destination`, keeping its basename.
pub fn move_to_directory(record: &mut DocumentRecord, destination: &Path) -> MoveOutcome {
    let from = record.source_path.clone();
    let Some(name) = from.file_name() else {
        let reason = format!("path has no file name: {}", from.display());
        warn!(path = %from.display(), "move failed: no file name");
        return MoveOutcome::Failed(reason);
    };
    let to = destination.join(name);

    match move_file(&from, &to) {
        Ok(()) => {
            info!(from = %from.display(), to = %to.display(), "moved file");
            record.source_path = to.clone();
            MoveOutcome::Moved { from, to }
        }
        Err(error) => {
            warn!(path = %from.display(), error = %format!("{error:#}"), "move failed");
            MoveOutcome::Failed(format!("{error:#}"))
        }
    }
}

fn rename_without_overwrite(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("file not found: {}", from.display());
    }
    if to.exists() {
        bail!("target already exists: {}", to.display());
    }

    fs::rename(from, to)
        .with_context(|| format!("failed to rename {} to {}", from.display(), to.display()))
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        bail!("target already exists: {}", to.display());
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Plain rename fails across filesystems; fall back to copy + remove.
    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    fs::remove_file(from)
        .with_context(|| format!("failed to remove {} after copy", from.display()))
}
