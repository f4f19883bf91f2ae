//! Board list domain model.
//!
//! # Responsibility
//! - Define boards, folders and the ordered index that groups them.
//! - Provide read-only lookup helpers shared by the store, the drag engine
//!   and the import/export pipeline.
//!
//! # Invariants
//! - A board id appears at most once across root items and folder contents
//!   once the list has passed through `board_list::normalize`.
//! - Folders hold boards only; containment is one level deep by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque board identifier.
///
/// Imported bundles may carry ids that are not UUIDs, so ids stay strings.
pub type BoardId = String;

/// Opaque folder identifier.
pub type FolderId = String;

/// One addressable drawing canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Reference to a rendered preview, owned by the host.
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Board {
    /// Creates a board with a fresh id and both timestamps set to now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: new_item_id(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            thumbnail: None,
        }
    }
}

/// Named one-level group of boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFolder {
    pub id: FolderId,
    pub name: String,
    pub items: Vec<Board>,
}

/// One entry of the ordered board list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BoardListItem {
    Board(Board),
    Folder(BoardFolder),
}

impl BoardListItem {
    /// Id of the board or folder.
    pub fn id(&self) -> &str {
        match self {
            Self::Board(board) => board.id.as_str(),
            Self::Folder(folder) => folder.id.as_str(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Board(_) => ItemKind::Board,
            Self::Folder(_) => ItemKind::Folder,
        }
    }
}

/// Discriminant of `BoardListItem`, used by drag events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Board,
    Folder,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Folder => "folder",
        }
    }
}

/// Where a board currently lives in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardLocation {
    /// Root-level board at `index`.
    Root { index: usize },
    /// Board inside the folder at root `folder_index`, at `index` within it.
    Nested { folder_index: usize, index: usize },
}

impl BoardLocation {
    /// Root position of the board or of its parent folder.
    pub fn root_index(self) -> usize {
        match self {
            Self::Root { index } => index,
            Self::Nested { folder_index, .. } => folder_index,
        }
    }
}

/// Full ordered collection plus the active board pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardsIndex {
    pub items: Vec<BoardListItem>,
    pub active_board_id: Option<BoardId>,
}

impl BoardsIndex {
    pub fn board(&self, board_id: &str) -> Option<&Board> {
        find_board(&self.items, board_id)
    }

    /// Boards in display order, folder contents inlined.
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        iter_boards(&self.items)
    }
}

/// Creates a new opaque id for boards and synthesized folders.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time truncated to millisecond precision, matching storage.
pub fn now_millis() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now)
}

/// Iterates boards in display order, folder contents inlined.
pub fn iter_boards(items: &[BoardListItem]) -> impl Iterator<Item = &Board> {
    items.iter().flat_map(|item| match item {
        BoardListItem::Board(board) => std::slice::from_ref(board).iter(),
        BoardListItem::Folder(folder) => folder.items.iter(),
    })
}

pub fn find_board<'a>(items: &'a [BoardListItem], board_id: &str) -> Option<&'a Board> {
    iter_boards(items).find(|board| board.id == board_id)
}

pub fn board_exists(items: &[BoardListItem], board_id: &str) -> bool {
    find_board(items, board_id).is_some()
}

/// First board in display order.
pub fn first_board_id(items: &[BoardListItem]) -> Option<BoardId> {
    iter_boards(items).next().map(|board| board.id.clone())
}

/// Locates a board by id. Returns the first occurrence.
pub fn locate_board(items: &[BoardListItem], board_id: &str) -> Option<BoardLocation> {
    for (root_index, item) in items.iter().enumerate() {
        match item {
            BoardListItem::Board(board) if board.id == board_id => {
                return Some(BoardLocation::Root { index: root_index });
            }
            BoardListItem::Board(_) => {}
            BoardListItem::Folder(folder) => {
                if let Some(index) = folder.items.iter().position(|board| board.id == board_id) {
                    return Some(BoardLocation::Nested {
                        folder_index: root_index,
                        index,
                    });
                }
            }
        }
    }
    None
}

/// Root position of the folder with `folder_id`.
pub fn locate_folder(items: &[BoardListItem], folder_id: &str) -> Option<usize> {
    items.iter().position(|item| match item {
        BoardListItem::Folder(folder) => folder.id == folder_id,
        BoardListItem::Board(_) => false,
    })
}

/// Keeps `active` when it still names a board, otherwise falls back to the
/// first board in display order.
pub fn resolve_active_board_id(items: &[BoardListItem], active: Option<&str>) -> Option<BoardId> {
    match active {
        Some(id) if board_exists(items, id) => Some(id.to_string()),
        _ => first_board_id(items),
    }
}
