//! Host-facing board shelf session.
//!
//! # Responsibility
//! - Own one index store, one autosave bridge, the drag engine and folder
//!   view state for a single window.
//! - Enforce cross-component ordering: pending canvas edits are flushed
//!   before the active board changes and before export.
//!
//! # Invariants
//! - The mounted canvas, when any, belongs to the active board.
//! - A failed flush aborts the switch/export that required it.

use crate::board_list::{DragReorderEngine, DropTarget, FolderViewState, HoverTarget};
use crate::model::board::{Board, BoardListItem, BoardsIndex, ItemKind};
use crate::model::bundle::ExportBundle;
use crate::model::snapshot::CanvasSnapshot;
use crate::repo::board_repo::{BoardRepoError, BoardRepository};
use crate::service::autosave::{AutoSaveBridge, CanvasSurface, SaveOutcome};
use crate::service::index_store::{BoardIndexStore, StoreError};
use crate::service::transfer::{self, ImportCandidate, ImportSummary, TransferError};
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{Duration, Instant};

/// Errors surfaced by session operations.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    /// Snapshot load or save failed.
    Snapshot(BoardRepoError),
    Transfer(TransferError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "canvas snapshot: {err}"),
            Self::Transfer(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::Transfer(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BoardRepoError> for SessionError {
    fn from(value: BoardRepoError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<TransferError> for SessionError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// One window's view of the shelf.
pub struct ShelfSession<R: BoardRepository + Clone> {
    store: BoardIndexStore<R>,
    bridge: AutoSaveBridge<R>,
    drag: DragReorderEngine,
    folder_view: FolderViewState,
    loaded_snapshot: Option<CanvasSnapshot>,
}

impl<R: BoardRepository + Clone> ShelfSession<R> {
    pub fn open(repo: R, autosave_delay: Duration) -> SessionResult<Self> {
        let bridge = AutoSaveBridge::new(repo.clone(), autosave_delay);
        let store = BoardIndexStore::load(repo)?;
        info!(
            "event=session_open module=session status=ok items={}",
            store.items().len()
        );
        Ok(Self {
            store,
            bridge,
            drag: DragReorderEngine::new(),
            folder_view: FolderViewState::new(),
            loaded_snapshot: None,
        })
    }

    pub fn index(&self) -> &BoardsIndex {
        self.store.index()
    }

    pub fn items(&self) -> &[BoardListItem] {
        self.store.items()
    }

    pub fn active_board_id(&self) -> Option<&str> {
        self.store.active_board_id()
    }

    pub fn store(&self) -> &BoardIndexStore<R> {
        &self.store
    }

    pub fn folder_view(&self) -> &FolderViewState {
        &self.folder_view
    }

    pub fn mounted_board_id(&self) -> Option<&str> {
        self.bridge.mounted_board_id()
    }

    /// Flushes the mounted canvas and makes `board_id` active.
    ///
    /// The canvas is unmounted; the host mounts the new one afterwards.
    pub fn activate_board(&mut self, board_id: &str) -> SessionResult<()> {
        if self.store.active_board_id() == Some(board_id) {
            return Ok(());
        }
        self.bridge.flush()?;
        self.store.set_active_board(board_id)?;
        self.bridge.unmount();
        self.loaded_snapshot = None;
        Ok(())
    }

    /// Mounts a canvas for the active board and returns the snapshot to
    /// render, `None` when there is no active board or it has no content.
    ///
    /// A canvas that is still mounted is flushed before it is replaced.
    pub fn mount_canvas(
        &mut self,
        surface: Box<dyn CanvasSurface>,
    ) -> SessionResult<Option<CanvasSnapshot>> {
        if self.bridge.mounted_board_id().is_some() {
            self.bridge.flush()?;
        }
        let Some(board_id) = self.store.active_board_id().map(str::to_string) else {
            self.bridge.unmount();
            return Ok(None);
        };
        let snapshot = self.store.repo().load_snapshot(&board_id)?;
        self.bridge.mount(board_id, surface);
        self.loaded_snapshot = snapshot.clone();
        Ok(snapshot)
    }

    /// Host reports the mounted canvas finished loading.
    pub fn canvas_ready(&mut self) {
        let initial = self.loaded_snapshot.take();
        self.bridge.mark_ready(initial.as_ref());
    }

    /// Activates `board_id` and mounts `surface` for it.
    pub fn switch_board(
        &mut self,
        board_id: &str,
        surface: Box<dyn CanvasSurface>,
    ) -> SessionResult<Option<CanvasSnapshot>> {
        self.activate_board(board_id)?;
        self.mount_canvas(surface)
    }

    pub fn notify_change(&mut self, now: Instant) -> bool {
        self.bridge.notify_change(now)
    }

    pub fn poll(&mut self, now: Instant) -> SessionResult<SaveOutcome> {
        Ok(self.bridge.poll(now)?)
    }

    pub fn flush(&mut self) -> SessionResult<SaveOutcome> {
        Ok(self.bridge.flush()?)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Starts dragging a row. Dragging a board activates it.
    pub fn begin_drag(&mut self, item_id: &str, kind: ItemKind) -> SessionResult<()> {
        if let Some(board_id) = self.drag.start(item_id, kind) {
            if let Err(err) = self.activate_board(&board_id) {
                self.drag.cancel();
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn hover_drag(&mut self, center_y: f64, target: Option<&HoverTarget>) -> Option<DropTarget> {
        self.drag
            .hover(self.store.items(), center_y, target)
            .cloned()
    }

    /// Finishes the drag. Returns whether the list changed.
    pub fn end_drag(&mut self) -> SessionResult<bool> {
        let outcome = self.drag.end(self.store.items());
        let changed = self.store.apply_drop(outcome)?;
        if changed {
            self.folder_view.retain_existing(self.store.items());
        }
        Ok(changed)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn toggle_folder(&mut self, folder_id: &str) -> bool {
        self.folder_view.toggle(folder_id)
    }

    /// Creates a board; it becomes active, so the current canvas is flushed
    /// and unmounted.
    pub fn create_board(&mut self, name: &str) -> SessionResult<Board> {
        self.bridge.flush()?;
        let board = self.store.create_board(name)?;
        self.bridge.unmount();
        self.loaded_snapshot = None;
        Ok(board)
    }

    pub fn rename_board(&mut self, board_id: &str, name: &str) -> SessionResult<Board> {
        Ok(self.store.rename_board(board_id, name)?)
    }

    /// Deletes a board. Pending edits of a deleted mounted board are dropped.
    pub fn delete_board(&mut self, board_id: &str) -> SessionResult<()> {
        if self.bridge.mounted_board_id() == Some(board_id) {
            self.bridge.unmount();
            self.loaded_snapshot = None;
        } else {
            self.bridge.flush()?;
        }
        self.store.delete_board(board_id)?;
        self.folder_view.retain_existing(self.store.items());
        Ok(())
    }

    /// Duplicates a board including edits still pending on its canvas.
    pub fn duplicate_board(&mut self, board_id: &str, name: Option<&str>) -> SessionResult<Board> {
        self.bridge.flush()?;
        Ok(self.store.duplicate_board(board_id, name)?)
    }

    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> SessionResult<()> {
        Ok(self.store.rename_folder(folder_id, name)?)
    }

    pub fn ungroup_folder(&mut self, folder_id: &str) -> SessionResult<()> {
        self.store.ungroup_folder(folder_id)?;
        self.folder_view.expand(folder_id);
        Ok(())
    }

    pub fn group_boards(&mut self, board_ids: &[&str], name: Option<&str>) -> SessionResult<String> {
        let folder_id = self.store.group_boards(board_ids, name)?;
        self.folder_view.retain_existing(self.store.items());
        Ok(folder_id)
    }

    /// Flushes the mounted canvas and writes the whole collection to `path`.
    pub fn export_bundle(&mut self, path: &Path) -> SessionResult<ExportBundle> {
        self.bridge.flush()?;
        Ok(transfer::export_bundle(self.store.repo(), path)?)
    }

    /// Reads a bundle and lists its candidates against the current boards.
    pub fn read_import(&self, path: &Path) -> SessionResult<(ExportBundle, Vec<ImportCandidate>)> {
        let bundle = transfer::read_bundle(path)?;
        let existing_ids = self
            .store
            .index()
            .boards()
            .map(|board| board.id.clone())
            .collect::<HashSet<_>>();
        let candidates = transfer::build_candidates(&bundle, &existing_ids);
        Ok((bundle, candidates))
    }

    /// Imports the selected entries and reloads the index.
    pub fn import(
        &mut self,
        bundle: &ExportBundle,
        selected: &[usize],
    ) -> SessionResult<ImportSummary> {
        let summary = transfer::import_bundle(self.store.repo(), bundle, selected)?;
        self.store.refresh()?;
        Ok(summary)
    }

    /// Flushes and detaches the canvas.
    pub fn close(&mut self) -> SessionResult<()> {
        self.drag.cancel();
        self.bridge.flush()?;
        self.bridge.unmount();
        self.folder_view.reset();
        info!("event=session_close module=session status=ok");
        Ok(())
    }
}
