//! Canonical in-memory board index backed by the persistence boundary.
//!
//! # Responsibility
//! - Own the ordered board list and active board id seen by the host UI.
//! - Route every mutation through `normalize` and the repository.
//! - Provide folder edits (rename, ungroup, group) above the repository.
//!
//! # Invariants
//! - The cached index is replaced only after storage accepted the change;
//!   a failed write leaves it untouched.
//! - The cached index is always normalized.
//! - Display names are trimmed and never blank.

use crate::board_list::{normalize, DropOutcome};
use crate::model::board::{
    board_exists, find_board, locate_board, locate_folder, new_item_id, Board, BoardFolder,
    BoardId, BoardListItem, BoardLocation, BoardsIndex,
};
use crate::repo::board_repo::{BoardRepoError, BoardRepository};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_FOLDER_NAME: &str = "New folder";

/// Errors from board index store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Name is blank after trim.
    InvalidName,
    /// Target board does not exist.
    BoardNotFound(BoardId),
    /// Target folder does not exist.
    FolderNotFound(String),
    /// Grouping needs at least two distinct boards.
    NotEnoughBoards,
    /// Repository-level failure.
    Repo(BoardRepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::NotEnoughBoards => write!(f, "a folder needs at least two boards"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoardRepoError> for StoreError {
    fn from(value: BoardRepoError) -> Self {
        match value {
            BoardRepoError::BoardNotFound(id) => Self::BoardNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Board index store over a repository implementation.
pub struct BoardIndexStore<R: BoardRepository> {
    repo: R,
    index: BoardsIndex,
}

impl<R: BoardRepository> BoardIndexStore<R> {
    /// Loads the current index from `repo`.
    pub fn load(repo: R) -> Result<Self, StoreError> {
        let index = repo.get_index()?;
        info!(
            "event=index_load module=store status=ok items={}",
            index.items.len()
        );
        Ok(Self { repo, index })
    }

    pub fn index(&self) -> &BoardsIndex {
        &self.index
    }

    pub fn items(&self) -> &[BoardListItem] {
        &self.index.items
    }

    pub fn active_board_id(&self) -> Option<&str> {
        self.index.active_board_id.as_deref()
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Re-reads the index after an external change (import, another writer).
    pub fn refresh(&mut self) -> Result<&BoardsIndex, StoreError> {
        self.index = self.repo.get_index()?;
        Ok(&self.index)
    }

    /// Normalizes `items` and replaces the stored list with them.
    pub fn write(&mut self, items: Vec<BoardListItem>) -> Result<&BoardsIndex, StoreError> {
        let items = normalize(items);
        self.index = self.repo.set_index(items)?;
        Ok(&self.index)
    }

    /// Writes a committed drop. Returns whether anything was written.
    pub fn apply_drop(&mut self, outcome: DropOutcome) -> Result<bool, StoreError> {
        match outcome {
            DropOutcome::Discarded => Ok(false),
            DropOutcome::Committed(items) => {
                self.write(items)?;
                Ok(true)
            }
        }
    }

    /// Creates an empty board at the end of the list and activates it.
    pub fn create_board(&mut self, name: &str) -> Result<Board, StoreError> {
        let name = normalize_name(name)?;
        let board = self.repo.create_board(&name)?;
        self.refresh()?;
        Ok(board)
    }

    pub fn rename_board(&mut self, board_id: &str, name: &str) -> Result<Board, StoreError> {
        let name = normalize_name(name)?;
        let board = self.repo.rename_board(board_id, &name)?;
        self.refresh()?;
        Ok(board)
    }

    /// Deletes a board and its snapshot; folders it leaves behind collapse.
    pub fn delete_board(&mut self, board_id: &str) -> Result<(), StoreError> {
        self.repo.delete_board(board_id)?;
        self.refresh()?;
        Ok(())
    }

    /// Copies a board. `new_name` defaults to "`<name>` (Copy)".
    pub fn duplicate_board(
        &mut self,
        board_id: &str,
        new_name: Option<&str>,
    ) -> Result<Board, StoreError> {
        let source = self
            .index
            .board(board_id)
            .ok_or_else(|| StoreError::BoardNotFound(board_id.to_string()))?;
        let name = match new_name {
            Some(name) => normalize_name(name)?,
            None => format!("{} (Copy)", source.name),
        };
        let board = self.repo.duplicate_board(board_id, &name)?;
        self.refresh()?;
        Ok(board)
    }

    pub fn set_active_board(&mut self, board_id: &str) -> Result<(), StoreError> {
        if self.active_board_id() == Some(board_id) {
            return Ok(());
        }
        self.repo.set_active_board(board_id)?;
        self.index.active_board_id = Some(board_id.to_string());
        debug!("event=board_activate module=store status=ok");
        Ok(())
    }

    pub fn set_thumbnail(
        &mut self,
        board_id: &str,
        thumbnail: Option<&str>,
    ) -> Result<(), StoreError> {
        self.repo.set_thumbnail(board_id, thumbnail)?;
        self.refresh()?;
        Ok(())
    }

    /// Renames one folder.
    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> Result<(), StoreError> {
        let name = normalize_name(name)?;
        let mut items = self.index.items.clone();
        let index = locate_folder(&items, folder_id)
            .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;
        if let BoardListItem::Folder(folder) = &mut items[index] {
            folder.name = name;
        }
        self.write(items)?;
        Ok(())
    }

    /// Dissolves a folder in place; its boards become root items where the
    /// folder stood, in folder order.
    pub fn ungroup_folder(&mut self, folder_id: &str) -> Result<(), StoreError> {
        let mut items = self.index.items.clone();
        let index = locate_folder(&items, folder_id)
            .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;
        if let BoardListItem::Folder(folder) = items.remove(index) {
            let boards = folder.items.into_iter().map(BoardListItem::Board);
            items.splice(index..index, boards);
        }
        self.write(items)?;
        Ok(())
    }

    /// Groups boards into a new folder placed where the first of them stood.
    ///
    /// Returns the new folder id.
    pub fn group_boards(
        &mut self,
        board_ids: &[&str],
        name: Option<&str>,
    ) -> Result<String, StoreError> {
        let name = match name {
            Some(name) => normalize_name(name)?,
            None => DEFAULT_FOLDER_NAME.to_string(),
        };

        let mut wanted = Vec::new();
        for board_id in board_ids {
            if !board_exists(&self.index.items, board_id) {
                return Err(StoreError::BoardNotFound(board_id.to_string()));
            }
            if !wanted.contains(board_id) {
                wanted.push(*board_id);
            }
        }
        if wanted.len() < 2 {
            return Err(StoreError::NotEnoughBoards);
        }

        let grouped = wanted
            .iter()
            .filter_map(|id| find_board(&self.index.items, id).cloned())
            .collect::<Vec<_>>();
        let anchor = wanted
            .iter()
            .filter_map(|id| locate_board(&self.index.items, id).map(BoardLocation::root_index))
            .min()
            .unwrap_or(0);

        let folder_id = new_item_id();
        let mut folder = Some(BoardListItem::Folder(BoardFolder {
            id: folder_id.clone(),
            name,
            items: grouped,
        }));
        let mut items = Vec::with_capacity(self.index.items.len() + 1);
        for (position, item) in self.index.items.iter().cloned().enumerate() {
            if position == anchor {
                items.extend(folder.take());
            }
            match item {
                BoardListItem::Board(board) if wanted.contains(&board.id.as_str()) => {}
                BoardListItem::Board(board) => items.push(BoardListItem::Board(board)),
                BoardListItem::Folder(mut existing) => {
                    existing
                        .items
                        .retain(|board| !wanted.contains(&board.id.as_str()));
                    items.push(BoardListItem::Folder(existing));
                }
            }
        }
        self.write(items)?;
        Ok(folder_id)
    }
}

fn normalize_name(value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidName);
    }
    Ok(trimmed.to_string())
}
