//! Folder invariant enforcement.
//!
//! # Responsibility
//! - Turn any candidate board list into a well-formed one before it is
//!   committed or after it is read from an external source.
//!
//! # Invariants
//! - Board ids are unique across root items and folder contents; the first
//!   occurrence in left-to-right order wins.
//! - No folder survives with fewer than two boards. A folder left with one
//!   board is replaced by that board at the folder's root position.
//! - Relative order of survivors is preserved.
//! - `normalize(normalize(x)) == normalize(x)`.

use crate::model::board::{BoardFolder, BoardListItem};
use std::collections::HashSet;

/// Normalizes a candidate list in one left-to-right pass.
pub fn normalize(items: Vec<BoardListItem>) -> Vec<BoardListItem> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(items.len());

    for item in items {
        match item {
            BoardListItem::Board(board) => {
                if seen.insert(board.id.clone()) {
                    normalized.push(BoardListItem::Board(board));
                }
            }
            BoardListItem::Folder(folder) => {
                let BoardFolder { id, name, items } = folder;
                let mut survivors = items
                    .into_iter()
                    .filter(|board| seen.insert(board.id.clone()))
                    .collect::<Vec<_>>();

                match survivors.len() {
                    0 => {}
                    1 => {
                        if let Some(board) = survivors.pop() {
                            normalized.push(BoardListItem::Board(board));
                        }
                    }
                    _ => normalized.push(BoardListItem::Folder(BoardFolder {
                        id,
                        name,
                        items: survivors,
                    })),
                }
            }
        }
    }

    normalized
}

/// Returns whether `items` is already in normalized form.
pub fn is_normalized(items: &[BoardListItem]) -> bool {
    let mut seen = HashSet::new();
    items.iter().all(|item| match item {
        BoardListItem::Board(board) => seen.insert(board.id.as_str()),
        BoardListItem::Folder(folder) => {
            folder.items.len() >= 2
                && folder
                    .items
                    .iter()
                    .all(|board| seen.insert(board.id.as_str()))
        }
    })
}

/// Number of distinct board ids in `items`.
pub fn distinct_board_count(items: &[BoardListItem]) -> usize {
    crate::model::board::iter_boards(items)
        .map(|board| board.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::{is_normalized, normalize};
    use crate::model::board::{Board, BoardFolder, BoardListItem};
    use chrono::{TimeZone, Utc};

    fn board(id: &str) -> Board {
        let at = Utc.timestamp_millis_opt(0).unwrap();
        Board {
            id: id.to_string(),
            name: id.to_uppercase(),
            created_at: at,
            updated_at: at,
            thumbnail: None,
        }
    }

    fn folder(id: &str, ids: &[&str]) -> BoardListItem {
        BoardListItem::Folder(BoardFolder {
            id: id.to_string(),
            name: id.to_string(),
            items: ids.iter().map(|id| board(id)).collect(),
        })
    }

    fn root(id: &str) -> BoardListItem {
        BoardListItem::Board(board(id))
    }

    #[test]
    fn drops_repeated_root_boards() {
        let items = normalize(vec![root("a"), root("b"), root("a")]);
        assert_eq!(items, vec![root("a"), root("b")]);
    }

    #[test]
    fn filters_cross_list_duplicates_out_of_folders() {
        let items = normalize(vec![root("a"), folder("f", &["a", "b", "c"])]);
        assert_eq!(items, vec![root("a"), folder("f", &["b", "c"])]);
    }

    #[test]
    fn single_board_folder_degrades_in_place() {
        let items = normalize(vec![root("x"), folder("f", &["a"]), root("y")]);
        assert_eq!(items, vec![root("x"), root("a"), root("y")]);
    }

    #[test]
    fn emptied_folder_is_dropped() {
        let items = normalize(vec![root("a"), folder("f", &["a"]), folder("g", &[])]);
        assert_eq!(items, vec![root("a")]);
    }

    #[test]
    fn later_root_duplicate_of_folder_board_is_dropped() {
        let items = normalize(vec![folder("f", &["a", "b"]), root("b")]);
        assert_eq!(items, vec![folder("f", &["a", "b"])]);
    }

    #[test]
    fn is_normalized_detects_violations() {
        assert!(is_normalized(&[root("a"), folder("f", &["b", "c"])]));
        assert!(!is_normalized(&[root("a"), root("a")]));
        assert!(!is_normalized(&[folder("f", &["a"])]));
        assert!(!is_normalized(&[folder("f", &["a", "b"]), folder("g", &["b", "c"])]));
    }
}
