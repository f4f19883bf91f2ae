//! Core of the board shelf: ordered board list, folder grouping, canvas
//! autosave and bundle import/export over SQLite.

pub mod board_list;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use board_list::{
    normalize, DragReorderEngine, DropIntent, DropOutcome, DropTarget, FolderViewState,
    HoverTarget, TargetRect,
};
pub use config::{ShelfConfig, ShelfPaths};
pub use db::{open_db, open_db_in_memory, open_shelf_db, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardFolder, BoardId, BoardListItem, BoardsIndex, FolderId, ItemKind};
pub use model::bundle::{BundleEntry, ExportBundle, BUNDLE_FORMAT_VERSION};
pub use model::snapshot::{CanvasSnapshot, Fingerprint, SceneCapture};
pub use repo::board_repo::{
    BoardRepoError, BoardRepoResult, BoardRepository, NewBoard, SqliteBoardRepository,
};
pub use service::autosave::{AutoSaveBridge, CanvasSurface, DebounceTimer, SaveOutcome};
pub use service::index_store::{BoardIndexStore, StoreError};
pub use service::session::{SessionError, SessionResult, ShelfSession};
pub use service::transfer::{ImportCandidate, ImportSummary, TransferError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
