//! Board index repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence boundary for the board index, board metadata
//!   and per-board canvas snapshots.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - Every index read and write passes through `normalize`.
//! - Index reads never lose a stored board: unreferenced boards are appended
//!   at root in creation order, dangling references are skipped.
//! - Index writes never create or delete boards; unknown ids are rejected.
//! - The stored active board always names an existing board, or is absent
//!   when there are no boards.

use crate::board_list::normalize;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::board::{
    now_millis, resolve_active_board_id, Board, BoardFolder, BoardId, BoardListItem, BoardsIndex,
    FolderId,
};
use crate::model::snapshot::CanvasSnapshot;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACTIVE_BOARD_KEY: &str = "active_board_id";

const BOARD_SELECT_SQL: &str = "SELECT
    id,
    name,
    created_at,
    updated_at,
    thumbnail
FROM boards";

/// Result type used by board repository operations.
pub type BoardRepoResult<T> = Result<T, BoardRepoError>;

/// Errors from board repository operations.
#[derive(Debug)]
pub enum BoardRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target board does not exist.
    BoardNotFound(BoardId),
    /// Index write references a board that is not stored.
    UnknownBoard(BoardId),
    /// Index write contains two folders with the same id.
    DuplicateFolderId(FolderId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for BoardRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::UnknownBoard(id) => write!(f, "board index references unknown board: {id}"),
            Self::DuplicateFolderId(id) => write!(f, "board index repeats folder id: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for BoardRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for BoardRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BoardRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Board to be created by a bulk import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBoard {
    pub name: String,
    pub thumbnail: Option<String>,
    /// Initial canvas; an empty canvas is written when absent.
    pub snapshot: Option<CanvasSnapshot>,
}

/// Persistence boundary consumed by the store, the autosave bridge and the
/// import/export pipeline.
pub trait BoardRepository {
    /// Loads the normalized index with a resolved active board.
    fn get_index(&self) -> BoardRepoResult<BoardsIndex>;
    /// Replaces list order/grouping and returns the canonical stored form.
    fn set_index(&self, items: Vec<BoardListItem>) -> BoardRepoResult<BoardsIndex>;
    /// Loads one board's metadata.
    fn get_board(&self, board_id: &str) -> BoardRepoResult<Option<Board>>;
    /// Creates an empty board at the end of the root list and activates it.
    fn create_board(&self, name: &str) -> BoardRepoResult<Board>;
    /// Renames one board.
    fn rename_board(&self, board_id: &str, name: &str) -> BoardRepoResult<Board>;
    /// Deletes one board and its snapshot.
    fn delete_board(&self, board_id: &str) -> BoardRepoResult<()>;
    /// Copies one board and its snapshot to the end of the root list.
    fn duplicate_board(&self, board_id: &str, new_name: &str) -> BoardRepoResult<Board>;
    /// Moves the active board pointer.
    fn set_active_board(&self, board_id: &str) -> BoardRepoResult<()>;
    /// Sets or clears the thumbnail reference.
    fn set_thumbnail(&self, board_id: &str, thumbnail: Option<&str>) -> BoardRepoResult<()>;
    /// Stores one board's canvas snapshot.
    fn save_snapshot(&self, board_id: &str, snapshot: &CanvasSnapshot) -> BoardRepoResult<()>;
    /// Loads one board's canvas snapshot, `None` when it has none.
    fn load_snapshot(&self, board_id: &str) -> BoardRepoResult<Option<CanvasSnapshot>>;
    /// Creates boards at the end of the root list, all or nothing.
    fn import_boards(&self, boards: &[NewBoard]) -> BoardRepoResult<Vec<Board>>;
}

/// SQLite-backed board repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> BoardRepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(BoardRepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn get_index(&self) -> BoardRepoResult<BoardsIndex> {
        let items = load_index_items(self.conn)?;
        let stored_active = get_setting(self.conn, ACTIVE_BOARD_KEY)?;
        let active_board_id = resolve_active_board_id(&items, stored_active.as_deref());
        if active_board_id != stored_active {
            set_setting(self.conn, ACTIVE_BOARD_KEY, active_board_id.as_deref())?;
        }

        Ok(BoardsIndex {
            items,
            active_board_id,
        })
    }

    fn set_index(&self, items: Vec<BoardListItem>) -> BoardRepoResult<BoardsIndex> {
        let items = normalize(items);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_boards_stored(&tx, &items)?;
        write_index_items(&tx, &items)?;
        tx.commit()?;

        info!(
            "event=index_write module=repo status=ok items={}",
            items.len()
        );
        self.get_index()
    }

    fn get_board(&self, board_id: &str) -> BoardRepoResult<Option<Board>> {
        load_board(self.conn, board_id)
    }

    fn create_board(&self, name: &str) -> BoardRepoResult<Board> {
        let board = Board::new(name);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_board(&tx, &board, &CanvasSnapshot::empty())?;
        append_root_board(&tx, &board.id)?;
        set_setting(&tx, ACTIVE_BOARD_KEY, Some(board.id.as_str()))?;
        tx.commit()?;
        Ok(board)
    }

    fn rename_board(&self, board_id: &str, name: &str) -> BoardRepoResult<Board> {
        let changed = self.conn.execute(
            "UPDATE boards
             SET name = ?2,
                 updated_at = ?3
             WHERE id = ?1;",
            params![board_id, name, now_millis().timestamp_millis()],
        )?;
        if changed == 0 {
            return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
        }
        load_required_board(self.conn, board_id)
    }

    fn delete_board(&self, board_id: &str) -> BoardRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM board_data WHERE board_id = ?1;", [board_id])?;
        let deleted = tx.execute("DELETE FROM boards WHERE id = ?1;", [board_id])?;
        if deleted == 0 {
            return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
        }

        // Dangling rows are skipped on load; rewriting collapses folders the
        // delete left with a single board.
        let items = load_index_items(&tx)?;
        write_index_items(&tx, &items)?;

        let stored_active = get_setting(&tx, ACTIVE_BOARD_KEY)?;
        let next_active = resolve_active_board_id(&items, stored_active.as_deref());
        set_setting(&tx, ACTIVE_BOARD_KEY, next_active.as_deref())?;

        tx.commit()?;
        Ok(())
    }

    fn duplicate_board(&self, board_id: &str, new_name: &str) -> BoardRepoResult<Board> {
        let original = load_required_board(self.conn, board_id)?;
        let snapshot = self
            .load_snapshot(board_id)?
            .unwrap_or_else(CanvasSnapshot::empty);

        let mut copy = Board::new(new_name);
        copy.thumbnail = original.thumbnail;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_board(&tx, &copy, &snapshot)?;
        append_root_board(&tx, &copy.id)?;
        tx.commit()?;
        Ok(copy)
    }

    fn set_active_board(&self, board_id: &str) -> BoardRepoResult<()> {
        if load_board(self.conn, board_id)?.is_none() {
            return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
        }
        set_setting(self.conn, ACTIVE_BOARD_KEY, Some(board_id))?;
        Ok(())
    }

    fn set_thumbnail(&self, board_id: &str, thumbnail: Option<&str>) -> BoardRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE boards
             SET thumbnail = ?2,
                 updated_at = ?3
             WHERE id = ?1;",
            params![board_id, thumbnail, now_millis().timestamp_millis()],
        )?;
        if changed == 0 {
            return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
        }
        Ok(())
    }

    fn save_snapshot(&self, board_id: &str, snapshot: &CanvasSnapshot) -> BoardRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE boards SET updated_at = ?2 WHERE id = ?1;",
            params![board_id, now_millis().timestamp_millis()],
        )?;
        if changed == 0 {
            return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
        }
        tx.execute(
            "INSERT OR REPLACE INTO board_data (board_id, data) VALUES (?1, ?2);",
            params![board_id, snapshot.to_json_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self, board_id: &str) -> BoardRepoResult<Option<CanvasSnapshot>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM board_data WHERE board_id = ?1;",
                [board_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(text) = data else {
            if load_board(self.conn, board_id)?.is_none() {
                return Err(BoardRepoError::BoardNotFound(board_id.to_string()));
            }
            return Ok(None);
        };

        CanvasSnapshot::from_json_str(&text).map(Some).map_err(|err| {
            BoardRepoError::InvalidData(format!("snapshot for board `{board_id}`: {err}"))
        })
    }

    fn import_boards(&self, boards: &[NewBoard]) -> BoardRepoResult<Vec<Board>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut created = Vec::with_capacity(boards.len());
        for new_board in boards {
            let mut board = Board::new(new_board.name.as_str());
            board.thumbnail = new_board.thumbnail.clone();
            let snapshot = new_board
                .snapshot
                .clone()
                .unwrap_or_else(CanvasSnapshot::empty);
            insert_board(&tx, &board, &snapshot)?;
            append_root_board(&tx, &board.id)?;
            created.push(board);
        }
        tx.commit()?;

        info!(
            "event=board_import module=repo status=ok created={}",
            created.len()
        );
        Ok(created)
    }
}

/// Reads the stored list, skipping dangling references and appending
/// unreferenced boards, then normalizes it.
pub(crate) fn load_index_items(conn: &Connection) -> BoardRepoResult<Vec<BoardListItem>> {
    let boards = load_all_boards(conn)?;
    let by_id = boards
        .iter()
        .map(|board| (board.id.as_str(), board))
        .collect::<HashMap<_, _>>();

    let mut folder_names = HashMap::new();
    {
        let mut stmt = conn.prepare("SELECT id, name FROM folders;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            folder_names.insert(id, name);
        }
    }

    let mut items = Vec::new();
    let mut stmt =
        conn.prepare("SELECT item_type, item_id FROM index_items ORDER BY position ASC;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let item_type: String = row.get(0)?;
        let item_id: String = row.get(1)?;
        match item_type.as_str() {
            "board" => {
                if let Some(board) = by_id.get(item_id.as_str()) {
                    items.push(BoardListItem::Board((*board).clone()));
                }
            }
            "folder" => {
                if let Some(name) = folder_names.get(&item_id) {
                    let folder_boards = load_folder_board_ids(conn, &item_id)?
                        .into_iter()
                        .filter_map(|id| by_id.get(id.as_str()).map(|board| (*board).clone()))
                        .collect();
                    items.push(BoardListItem::Folder(BoardFolder {
                        id: item_id,
                        name: name.clone(),
                        items: folder_boards,
                    }));
                }
            }
            other => {
                return Err(BoardRepoError::InvalidData(format!(
                    "invalid item type `{other}` in index_items.item_type"
                )));
            }
        }
    }

    let mut items = normalize(items);
    let referenced = crate::model::board::iter_boards(&items)
        .map(|board| board.id.clone())
        .collect::<HashSet<_>>();
    let orphans = boards
        .iter()
        .filter(|board| !referenced.contains(&board.id))
        .cloned()
        .map(BoardListItem::Board)
        .collect::<Vec<_>>();
    items.extend(orphans);
    Ok(items)
}

/// Replaces every index row with `items`.
pub(crate) fn write_index_items(conn: &Connection, items: &[BoardListItem]) -> BoardRepoResult<()> {
    conn.execute("DELETE FROM index_items;", [])?;
    conn.execute("DELETE FROM folder_items;", [])?;
    conn.execute("DELETE FROM folders;", [])?;

    let mut folder_ids = HashSet::new();
    for (position, item) in items.iter().enumerate() {
        match item {
            BoardListItem::Board(board) => {
                conn.execute(
                    "INSERT INTO index_items (position, item_type, item_id) VALUES (?1, 'board', ?2);",
                    params![position as i64, board.id],
                )?;
            }
            BoardListItem::Folder(folder) => {
                if !folder_ids.insert(folder.id.as_str()) {
                    return Err(BoardRepoError::DuplicateFolderId(folder.id.clone()));
                }
                conn.execute(
                    "INSERT INTO folders (id, name) VALUES (?1, ?2);",
                    params![folder.id, folder.name],
                )?;
                conn.execute(
                    "INSERT INTO index_items (position, item_type, item_id) VALUES (?1, 'folder', ?2);",
                    params![position as i64, folder.id],
                )?;
                for (folder_position, board) in folder.items.iter().enumerate() {
                    conn.execute(
                        "INSERT INTO folder_items (folder_id, board_id, position) VALUES (?1, ?2, ?3);",
                        params![folder.id, board.id, folder_position as i64],
                    )?;
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn insert_board(
    conn: &Connection,
    board: &Board,
    snapshot: &CanvasSnapshot,
) -> BoardRepoResult<()> {
    conn.execute(
        "INSERT INTO boards (id, name, created_at, updated_at, thumbnail)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            board.id,
            board.name,
            board.created_at.timestamp_millis(),
            board.updated_at.timestamp_millis(),
            board.thumbnail,
        ],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO board_data (board_id, data) VALUES (?1, ?2);",
        params![board.id, snapshot.to_json_string()],
    )?;
    Ok(())
}

pub(crate) fn get_setting(conn: &Connection, key: &str) -> BoardRepoResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub(crate) fn set_setting(conn: &Connection, key: &str, value: Option<&str>) -> BoardRepoResult<()> {
    match value {
        Some(value) => conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2);",
            params![key, value],
        )?,
        None => conn.execute("DELETE FROM settings WHERE key = ?1;", [key])?,
    };
    Ok(())
}

pub(crate) fn set_active_setting(conn: &Connection, board_id: Option<&str>) -> BoardRepoResult<()> {
    set_setting(conn, ACTIVE_BOARD_KEY, board_id)
}

fn append_root_board(conn: &Connection, board_id: &str) -> BoardRepoResult<()> {
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM index_items;",
        [],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO index_items (position, item_type, item_id) VALUES (?1, 'board', ?2);",
        params![position, board_id],
    )?;
    Ok(())
}

fn ensure_boards_stored(conn: &Connection, items: &[BoardListItem]) -> BoardRepoResult<()> {
    let stored = load_all_boards(conn)?
        .into_iter()
        .map(|board| board.id)
        .collect::<HashSet<_>>();
    match crate::model::board::iter_boards(items).find(|board| !stored.contains(&board.id)) {
        Some(board) => Err(BoardRepoError::UnknownBoard(board.id.clone())),
        None => Ok(()),
    }
}

fn load_all_boards(conn: &Connection) -> BoardRepoResult<Vec<Board>> {
    let mut stmt = conn.prepare(&format!("{BOARD_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut boards = Vec::new();
    while let Some(row) = rows.next()? {
        boards.push(parse_board_row(row)?);
    }
    Ok(boards)
}

fn load_folder_board_ids(conn: &Connection, folder_id: &str) -> BoardRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT board_id FROM folder_items WHERE folder_id = ?1 ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([folder_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn load_board(conn: &Connection, board_id: &str) -> BoardRepoResult<Option<Board>> {
    let mut stmt = conn.prepare(&format!("{BOARD_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([board_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_board_row(row)?));
    }
    Ok(None)
}

fn load_required_board(conn: &Connection, board_id: &str) -> BoardRepoResult<Board> {
    load_board(conn, board_id)?.ok_or_else(|| BoardRepoError::BoardNotFound(board_id.to_string()))
}

fn parse_board_row(row: &Row<'_>) -> BoardRepoResult<Board> {
    Ok(Board {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: datetime_from_millis(row.get("created_at")?, "boards.created_at")?,
        updated_at: datetime_from_millis(row.get("updated_at")?, "boards.updated_at")?,
        thumbnail: row.get("thumbnail")?,
    })
}

fn datetime_from_millis(value: i64, column: &'static str) -> BoardRepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| {
        BoardRepoError::InvalidData(format!("invalid timestamp `{value}` in {column}"))
    })
}
