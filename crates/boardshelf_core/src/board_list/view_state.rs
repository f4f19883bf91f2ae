//! Process-local folder view state.
//!
//! # Responsibility
//! - Remember which folders the user collapsed in the board list.
//!
//! # Invariants
//! - Only ids of folders present in the latest index are retained.
//! - State is dropped at defined reset points (`reset`), never persisted.

use crate::model::board::{BoardListItem, FolderId};
use std::collections::HashSet;

/// Collapsed-folder cache keyed by folder id.
#[derive(Debug, Clone, Default)]
pub struct FolderViewState {
    collapsed: HashSet<FolderId>,
}

impl FolderViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, folder_id: &str) -> bool {
        self.collapsed.contains(folder_id)
    }

    /// Flips one folder and returns its new collapsed state.
    pub fn toggle(&mut self, folder_id: &str) -> bool {
        if self.collapsed.remove(folder_id) {
            false
        } else {
            self.collapsed.insert(folder_id.to_string());
            true
        }
    }

    pub fn expand(&mut self, folder_id: &str) {
        self.collapsed.remove(folder_id);
    }

    /// Forgets folders that no longer exist after an index change.
    pub fn retain_existing(&mut self, items: &[BoardListItem]) {
        let live = items
            .iter()
            .filter_map(|item| match item {
                BoardListItem::Folder(folder) => Some(folder.id.as_str()),
                BoardListItem::Board(_) => None,
            })
            .collect::<HashSet<_>>();
        self.collapsed.retain(|id| live.contains(id.as_str()));
    }

    pub fn reset(&mut self) {
        self.collapsed.clear();
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }
}
