//! Bundle export and selective import.
//!
//! # Responsibility
//! - Write the whole collection, in display order, to a versioned bundle.
//! - Parse bundles leniently and present import candidates with a default
//!   selection.
//! - Import a chosen subset as new root boards in one transaction.
//!
//! # Invariants
//! - Malformed or empty bundles are rejected before any mutation.
//! - Candidate keys are unique within one bundle.
//! - Import never changes existing boards or the active board.
//! - `imported + skipped` always equals the bundle entry count.

use crate::model::board::{iter_boards, now_millis};
use crate::model::bundle::{BundleEntry, ExportBundle, BUNDLE_FORMAT_VERSION};
use crate::model::snapshot::CanvasSnapshot;
use crate::repo::board_repo::{BoardRepoError, BoardRepository, NewBoard};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const IMPORTED_BOARD_NAME: &str = "Imported board";

/// Errors from bundle export/import.
#[derive(Debug)]
pub enum TransferError {
    /// Bundle file could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Bundle text is not valid JSON for the bundle layout.
    Json(serde_json::Error),
    /// Bundle has no `boards` array, or it is empty.
    NoBoardsFound,
    /// Bundle was written by a newer layout.
    UnsupportedBundleVersion { found: u64, supported: u32 },
    /// Repository-level failure.
    Repo(BoardRepoError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "bundle file `{}`: {source}", path.display()),
            Self::Json(err) => write!(f, "invalid bundle: {err}"),
            Self::NoBoardsFound => write!(f, "no boards found"),
            Self::UnsupportedBundleVersion { found, supported } => write!(
                f,
                "bundle version {found} is newer than supported version {supported}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoardRepoError> for TransferError {
    fn from(value: BoardRepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// One bundle entry as offered for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    /// Position in the bundle; selections refer to it.
    pub index: usize,
    /// Stable key, unique within the bundle.
    pub key: String,
    pub declared_id: Option<String>,
    pub name: String,
    pub has_data: bool,
    /// Id already exists in the collection or earlier in the bundle.
    pub duplicate: bool,
    /// Default selection state.
    pub selected: bool,
}

/// Result of a committed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Assembles a bundle from the stored index and snapshots.
pub fn build_bundle<R: BoardRepository>(repo: &R) -> Result<ExportBundle, TransferError> {
    let index = repo.get_index()?;
    let mut boards = Vec::new();
    for board in iter_boards(&index.items) {
        let data = repo.load_snapshot(&board.id)?.map(CanvasSnapshot::into_value);
        boards.push(BundleEntry::from_board(board, data));
    }

    Ok(ExportBundle {
        version: BUNDLE_FORMAT_VERSION,
        exported_at: Some(now_millis()),
        boards,
    })
}

/// Writes `bundle` as pretty JSON.
pub fn write_bundle(path: &Path, bundle: &ExportBundle) -> Result<(), TransferError> {
    let text = serde_json::to_string_pretty(bundle)?;
    std::fs::write(path, text).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds and writes a bundle. Callers flush pending canvas edits first.
pub fn export_bundle<R: BoardRepository>(
    repo: &R,
    path: &Path,
) -> Result<ExportBundle, TransferError> {
    let bundle = build_bundle(repo)?;
    write_bundle(path, &bundle)?;
    info!(
        "event=bundle_export module=transfer status=ok boards={}",
        bundle.boards.len()
    );
    Ok(bundle)
}

/// Parses bundle text.
///
/// # Errors
/// - [`TransferError::NoBoardsFound`] when `boards` is missing, not an array
///   or empty.
/// - [`TransferError::UnsupportedBundleVersion`] for newer layouts.
pub fn parse_bundle(text: &str) -> Result<ExportBundle, TransferError> {
    let value: Value = serde_json::from_str(text)?;
    match value.get("boards").and_then(Value::as_array) {
        Some(boards) if !boards.is_empty() => {}
        _ => return Err(TransferError::NoBoardsFound),
    }
    if let Some(found) = value.get("version").and_then(Value::as_u64) {
        if found > u64::from(BUNDLE_FORMAT_VERSION) {
            return Err(TransferError::UnsupportedBundleVersion {
                found,
                supported: BUNDLE_FORMAT_VERSION,
            });
        }
    }
    Ok(serde_json::from_value(value)?)
}

pub fn read_bundle(path: &Path) -> Result<ExportBundle, TransferError> {
    let text = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bundle(&text)
}

/// Lists bundle entries with keys, duplicate flags and default selection.
pub fn build_candidates(
    bundle: &ExportBundle,
    existing_ids: &HashSet<String>,
) -> Vec<ImportCandidate> {
    let mut keys = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut candidates = Vec::with_capacity(bundle.boards.len());

    for (index, entry) in bundle.boards.iter().enumerate() {
        let declared_id = entry.declared_id().map(str::to_string);
        let duplicate = match declared_id.as_deref() {
            Some(id) => existing_ids.contains(id) || !seen_ids.insert(id.to_string()),
            None => false,
        };

        let base_key = declared_id
            .clone()
            .unwrap_or_else(|| format!("entry-{index}"));
        let key = unique_key(&base_key, &mut keys);

        candidates.push(ImportCandidate {
            index,
            key,
            declared_id,
            name: display_name(entry),
            has_data: entry.data.as_ref().is_some_and(|data| !data.is_null()),
            duplicate,
            selected: !duplicate,
        });
    }
    candidates
}

/// Indices selected by default.
pub fn default_selection(candidates: &[ImportCandidate]) -> Vec<usize> {
    candidates
        .iter()
        .filter(|candidate| candidate.selected)
        .map(|candidate| candidate.index)
        .collect()
}

/// Imports the entries at `selected` as new root boards.
///
/// Out-of-range and repeated indices are ignored. Every selected board is
/// created, or none is.
pub fn import_bundle<R: BoardRepository>(
    repo: &R,
    bundle: &ExportBundle,
    selected: &[usize],
) -> Result<ImportSummary, TransferError> {
    if bundle.boards.is_empty() {
        return Err(TransferError::NoBoardsFound);
    }

    let index = repo.get_index()?;
    let existing_ids = index
        .boards()
        .map(|board| board.id.clone())
        .collect::<HashSet<_>>();
    let mut used_names = index
        .boards()
        .map(|board| board.name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect::<HashSet<_>>();

    let candidates = build_candidates(bundle, &existing_ids);
    let selected = selected.iter().copied().collect::<HashSet<_>>();
    let mut new_boards = Vec::new();
    for candidate in candidates
        .iter()
        .filter(|candidate| selected.contains(&candidate.index))
    {
        let entry = &bundle.boards[candidate.index];
        let name = if candidate.duplicate {
            copy_name(&candidate.name, &used_names)
        } else {
            candidate.name.clone()
        };
        used_names.insert(name.to_lowercase());

        new_boards.push(NewBoard {
            name,
            thumbnail: entry.thumbnail.clone(),
            snapshot: entry
                .data
                .clone()
                .filter(|data| !data.is_null())
                .map(CanvasSnapshot::from_value),
        });
    }

    let created = if new_boards.is_empty() {
        Vec::new()
    } else {
        repo.import_boards(&new_boards)?
    };
    let summary = ImportSummary {
        imported: created.len(),
        skipped: bundle.boards.len() - created.len(),
    };

    if summary.imported == 0 {
        warn!("event=bundle_import module=transfer status=skip reason=nothing_selected");
    } else {
        info!(
            "event=bundle_import module=transfer status=ok imported={} skipped={}",
            summary.imported, summary.skipped
        );
    }
    Ok(summary)
}

fn display_name(entry: &BundleEntry) -> String {
    let trimmed = entry.name.trim();
    if trimmed.is_empty() {
        IMPORTED_BOARD_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn unique_key(base: &str, keys: &mut HashSet<String>) -> String {
    let mut key = base.to_string();
    let mut suffix = 2;
    while !keys.insert(key.clone()) {
        key = format!("{base}-{suffix}");
        suffix += 1;
    }
    key
}

fn copy_name(base: &str, used_names: &HashSet<String>) -> String {
    let mut candidate = format!("{base} (Copy)");
    let mut counter = 2;
    while used_names.contains(&candidate.to_lowercase()) {
        candidate = format!("{base} (Copy {counter})");
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::{copy_name, unique_key};
    use std::collections::HashSet;

    #[test]
    fn copy_name_skips_used_names_case_insensitively() {
        let used = HashSet::from(["plan (copy)".to_string(), "plan (copy 2)".to_string()]);
        assert_eq!(copy_name("Plan", &used), "Plan (Copy 3)");
        assert_eq!(copy_name("Other", &used), "Other (Copy)");
    }

    #[test]
    fn unique_key_appends_numeric_suffix() {
        let mut keys = HashSet::new();
        assert_eq!(unique_key("b1", &mut keys), "b1");
        assert_eq!(unique_key("b1", &mut keys), "b1-2");
        assert_eq!(unique_key("b1", &mut keys), "b1-3");
    }
}
