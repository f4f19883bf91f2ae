//! One-shot import of the pre-SQLite JSON board index.
//!
//! # Responsibility
//! - Detect a legacy `boards/index.json` next to a fresh database.
//! - Copy boards, folders, per-board canvas files and the active pointer
//!   into SQLite in one transaction.
//!
//! # Invariants
//! - Runs at most once per database (`legacy_json_migrated` setting).
//! - Never touches a database that already holds boards.
//! - Legacy files are read, never modified or deleted.

use crate::board_list::normalize;
use crate::config::ShelfPaths;
use crate::db::{DbError, DbResult};
use crate::model::board::{iter_boards, resolve_active_board_id, Board, BoardListItem, BoardsIndex};
use crate::model::snapshot::CanvasSnapshot;
use crate::repo::board_repo::{
    get_setting, insert_board, set_active_setting, set_setting, write_index_items,
    BoardRepoError,
};
use log::{info, warn};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MIGRATED_FLAG_KEY: &str = "legacy_json_migrated";

/// Oldest on-disk shape: a flat board list.
#[derive(Debug, Deserialize)]
struct FlatLegacyIndex {
    boards: Vec<Board>,
    #[serde(default)]
    active_board_id: Option<String>,
}

/// Imports the legacy JSON index once, if present.
pub fn migrate_legacy_json_if_needed(conn: &mut Connection, paths: &ShelfPaths) -> DbResult<()> {
    if get_setting(conn, MIGRATED_FLAG_KEY)
        .map_err(into_db_error)?
        .as_deref()
        == Some("1")
    {
        return Ok(());
    }

    let index_path = paths.legacy_index_path();
    let has_boards: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM boards LIMIT 1);",
        [],
        |row| row.get(0),
    )?;
    if !index_path.exists() || has_boards != 0 {
        set_setting(conn, MIGRATED_FLAG_KEY, Some("1")).map_err(into_db_error)?;
        return Ok(());
    }

    let legacy = read_legacy_index(&index_path)?;
    let items = normalize(legacy.items);

    let tx = conn.transaction()?;
    let mut inserted = 0usize;
    for board in iter_boards(&items) {
        let snapshot = read_legacy_board_data(paths, &board.id)?;
        insert_board(&tx, board, &snapshot).map_err(into_db_error)?;
        inserted += 1;
    }
    write_index_items(&tx, &items).map_err(into_db_error)?;

    let active = resolve_active_board_id(&items, legacy.active_board_id.as_deref());
    set_active_setting(&tx, active.as_deref()).map_err(into_db_error)?;
    set_setting(&tx, MIGRATED_FLAG_KEY, Some("1")).map_err(into_db_error)?;
    tx.commit()?;

    info!(
        "event=legacy_migrate module=db status=ok boards={} items={}",
        inserted,
        items.len()
    );
    Ok(())
}

fn read_legacy_index(path: &Path) -> DbResult<BoardsIndex> {
    let content = std::fs::read_to_string(path).map_err(|source| DbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&content).map_err(|err| DbError::LegacyData(err.to_string()))?;

    if value.get("items").is_some() {
        serde_json::from_value(value).map_err(|err| DbError::LegacyData(err.to_string()))
    } else if value.get("boards").is_some() {
        let flat: FlatLegacyIndex =
            serde_json::from_value(value).map_err(|err| DbError::LegacyData(err.to_string()))?;
        Ok(BoardsIndex {
            items: flat.boards.into_iter().map(BoardListItem::Board).collect(),
            active_board_id: flat.active_board_id,
        })
    } else {
        Ok(BoardsIndex::default())
    }
}

fn read_legacy_board_data(paths: &ShelfPaths, board_id: &str) -> DbResult<CanvasSnapshot> {
    let path = paths.legacy_board_data_path(board_id);
    if !path.exists() {
        return Ok(CanvasSnapshot::empty());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| DbError::Io {
        path: path.clone(),
        source,
    })?;
    match CanvasSnapshot::from_json_str(&content) {
        Ok(snapshot) => Ok(snapshot),
        Err(err) => {
            warn!(
                "event=legacy_migrate module=db status=skip reason=invalid_board_data error={}",
                err
            );
            Ok(CanvasSnapshot::empty())
        }
    }
}

fn into_db_error(err: BoardRepoError) -> DbError {
    match err {
        BoardRepoError::Db(err) => err,
        other => DbError::LegacyData(other.to_string()),
    }
}
