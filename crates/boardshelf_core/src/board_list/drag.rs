//! Drag-driven reordering and grouping of the board list.
//!
//! # Responsibility
//! - Track one drag gesture as an explicit state machine.
//! - Derive drop intent (before/after/inside) from pointer geometry.
//! - Build the candidate list for a committed drop and normalize it.
//!
//! # Invariants
//! - Folders never nest: a dragged folder only drops before/after.
//! - A board inside a folder is never a nesting target.
//! - A discarded drop never produces a new list; callers keep the old one.
//! - Committed lists have passed through `normalize`.

use crate::board_list::normalize::normalize;
use crate::model::board::{
    locate_board, locate_folder, new_item_id, Board, BoardFolder, BoardId, BoardListItem,
    BoardLocation, ItemKind,
};
use log::debug;

const FOLDER_SPLIT_RATIO: f64 = 0.5;
const NEST_BEFORE_RATIO: f64 = 0.3;
const NEST_AFTER_RATIO: f64 = 0.7;

/// Where the dragged item lands relative to the hovered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIntent {
    Before,
    After,
    /// Nest into the target folder, or merge with the target board.
    Inside,
}

impl DropIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

/// Vertical screen-space extent of a hovered row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRect {
    pub top: f64,
    pub height: f64,
}

/// Row currently under the pointer, as reported by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub id: String,
    pub kind: ItemKind,
    pub rect: TargetRect,
}

/// Resolved drop target for the current pointer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub over_id: String,
    pub over_kind: ItemKind,
    pub intent: DropIntent,
}

/// The one mutable record of an in-flight drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDrag {
    pub active_id: String,
    pub active_kind: ItemKind,
    pub over: Option<DropTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Result of ending a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing changes; the caller keeps its current list.
    Discarded,
    /// Normalized candidate list to be written to the store.
    Committed(Vec<BoardListItem>),
}

/// Finite-state machine for one drag gesture at a time.
#[derive(Debug, Default)]
pub struct DragReorderEngine {
    state: DragState,
}

impl DragReorderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Current drop target, if a drag is in flight and hovers a valid row.
    pub fn current_target(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging(drag) => drag.over.as_ref(),
            DragState::Idle => None,
        }
    }

    /// Enters `Dragging`. A drag already in flight is abandoned.
    ///
    /// Returns the board to select as active: dragging a board selects it.
    pub fn start(&mut self, active_id: impl Into<String>, active_kind: ItemKind) -> Option<BoardId> {
        let active_id = active_id.into();
        if self.is_dragging() {
            debug!("event=drag_start module=board_list status=restart");
        }
        debug!(
            "event=drag_start module=board_list status=ok kind={}",
            active_kind.as_str()
        );

        let select = match active_kind {
            ItemKind::Board => Some(active_id.clone()),
            ItemKind::Folder => None,
        };
        self.state = DragState::Dragging(ActiveDrag {
            active_id,
            active_kind,
            over: None,
        });
        select
    }

    /// Recomputes the drop target for a pointer move.
    ///
    /// `center_y` is the dragged row's vertical center. Targets that are not
    /// part of `items` clear the current target.
    pub fn hover(
        &mut self,
        items: &[BoardListItem],
        center_y: f64,
        target: Option<&HoverTarget>,
    ) -> Option<&DropTarget> {
        let DragState::Dragging(drag) = &mut self.state else {
            return None;
        };

        drag.over = target.and_then(|target| {
            let nested = match target.kind {
                ItemKind::Board => matches!(
                    locate_board(items, &target.id)?,
                    BoardLocation::Nested { .. }
                ),
                ItemKind::Folder => {
                    locate_folder(items, &target.id)?;
                    false
                }
            };
            Some(DropTarget {
                over_id: target.id.clone(),
                over_kind: target.kind,
                intent: compute_drop_intent(
                    drag.active_kind,
                    target.kind,
                    nested,
                    center_y,
                    target.rect,
                ),
            })
        });
        drag.over.as_ref()
    }

    /// Leaves `Dragging` and resolves the drop against `items`.
    pub fn end(&mut self, items: &[BoardListItem]) -> DropOutcome {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return DropOutcome::Discarded;
        };
        let Some(target) = drag.over else {
            debug!("event=drag_end module=board_list status=skip reason=no_target");
            return DropOutcome::Discarded;
        };

        match apply_drop(items, &drag.active_id, drag.active_kind, &target) {
            Some(next) => {
                debug!(
                    "event=drag_end module=board_list status=ok kind={} over_kind={} intent={}",
                    drag.active_kind.as_str(),
                    target.over_kind.as_str(),
                    target.intent.as_str()
                );
                DropOutcome::Committed(next)
            }
            None => {
                debug!("event=drag_end module=board_list status=skip reason=no_op");
                DropOutcome::Discarded
            }
        }
    }

    /// Abandons the drag without touching the list.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("event=drag_cancel module=board_list status=ok");
        }
        self.state = DragState::Idle;
    }
}

/// Maps the dragged row's vertical center onto the hovered row.
///
/// `target_nested` is true when the target is a board inside a folder.
pub fn compute_drop_intent(
    active_kind: ItemKind,
    target_kind: ItemKind,
    target_nested: bool,
    center_y: f64,
    rect: TargetRect,
) -> DropIntent {
    let ratio = if rect.height > 0.0 {
        ((center_y - rect.top) / rect.height).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let can_nest = active_kind == ItemKind::Board
        && (target_kind == ItemKind::Folder || !target_nested);

    if !can_nest {
        return if ratio < FOLDER_SPLIT_RATIO {
            DropIntent::Before
        } else {
            DropIntent::After
        };
    }

    if ratio < NEST_BEFORE_RATIO {
        DropIntent::Before
    } else if ratio > NEST_AFTER_RATIO {
        DropIntent::After
    } else {
        DropIntent::Inside
    }
}

/// Builds the normalized list for dropping `active_id` on `target`.
///
/// Returns `None` for drops that must not mutate anything: self drops,
/// folders dropped onto their own contents, and targets that vanished.
pub fn apply_drop(
    items: &[BoardListItem],
    active_id: &str,
    active_kind: ItemKind,
    target: &DropTarget,
) -> Option<Vec<BoardListItem>> {
    if target.over_id == active_id {
        return None;
    }

    let candidate = match active_kind {
        ItemKind::Folder => move_folder(items, active_id, target)?,
        ItemKind::Board => move_board(items, active_id, target)?,
    };
    Some(normalize(candidate))
}

fn move_folder(
    items: &[BoardListItem],
    folder_id: &str,
    target: &DropTarget,
) -> Option<Vec<BoardListItem>> {
    let from = locate_folder(items, folder_id)?;
    if let BoardListItem::Folder(folder) = &items[from] {
        if folder.items.iter().any(|board| board.id == target.over_id) {
            return None;
        }
    }

    let mut next = items.to_vec();
    let dragged = next.remove(from);
    let anchor = match target.over_kind {
        ItemKind::Folder => locate_folder(&next, &target.over_id)?,
        ItemKind::Board => locate_board(&next, &target.over_id)?.root_index(),
    };
    next.insert(edge_offset(anchor, target.intent), dragged);
    Some(next)
}

fn move_board(
    items: &[BoardListItem],
    board_id: &str,
    target: &DropTarget,
) -> Option<Vec<BoardListItem>> {
    let mut next = items.to_vec();
    let dragged = take_board(&mut next, board_id)?;

    match (target.over_kind, target.intent) {
        (ItemKind::Folder, DropIntent::Inside) => {
            let index = locate_folder(&next, &target.over_id)?;
            if let BoardListItem::Folder(folder) = &mut next[index] {
                folder.items.push(dragged);
            }
        }
        (ItemKind::Folder, intent) => {
            let index = locate_folder(&next, &target.over_id)?;
            next.insert(edge_offset(index, intent), BoardListItem::Board(dragged));
        }
        (ItemKind::Board, DropIntent::Inside) => {
            let BoardLocation::Root { index } = locate_board(&next, &target.over_id)? else {
                return None;
            };
            let BoardListItem::Board(anchor) = next.remove(index) else {
                return None;
            };
            next.insert(
                index,
                BoardListItem::Folder(BoardFolder {
                    id: new_item_id(),
                    name: anchor.name.clone(),
                    items: vec![anchor, dragged],
                }),
            );
        }
        (ItemKind::Board, intent) => match locate_board(&next, &target.over_id)? {
            BoardLocation::Root { index } => {
                next.insert(edge_offset(index, intent), BoardListItem::Board(dragged));
            }
            BoardLocation::Nested {
                folder_index,
                index,
            } => {
                if let BoardListItem::Folder(folder) = &mut next[folder_index] {
                    folder.items.insert(edge_offset(index, intent), dragged);
                }
            }
        },
    }

    Some(next)
}

/// Removes a board from wherever it lives. Containers are left for
/// `normalize` to clean up.
fn take_board(items: &mut Vec<BoardListItem>, board_id: &str) -> Option<Board> {
    match locate_board(items, board_id)? {
        BoardLocation::Root { index } => match items.remove(index) {
            BoardListItem::Board(board) => Some(board),
            BoardListItem::Folder(_) => None,
        },
        BoardLocation::Nested {
            folder_index,
            index,
        } => match &mut items[folder_index] {
            BoardListItem::Folder(folder) => Some(folder.items.remove(index)),
            BoardListItem::Board(_) => None,
        },
    }
}

fn edge_offset(index: usize, intent: DropIntent) -> usize {
    match intent {
        DropIntent::After => index + 1,
        DropIntent::Before | DropIntent::Inside => index,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_drop_intent, DropIntent, TargetRect};
    use crate::model::board::ItemKind;

    const ROW: TargetRect = TargetRect {
        top: 100.0,
        height: 40.0,
    };

    #[test]
    fn dragged_folder_splits_at_half() {
        let intent = |y| compute_drop_intent(ItemKind::Folder, ItemKind::Board, false, y, ROW);
        assert_eq!(intent(100.0), DropIntent::Before);
        assert_eq!(intent(119.0), DropIntent::Before);
        assert_eq!(intent(120.0), DropIntent::After);
        assert_eq!(intent(500.0), DropIntent::After);
    }

    #[test]
    fn dragged_board_nests_in_middle_band() {
        let intent = |y| compute_drop_intent(ItemKind::Board, ItemKind::Board, false, y, ROW);
        assert_eq!(intent(105.0), DropIntent::Before);
        assert_eq!(intent(120.0), DropIntent::Inside);
        assert_eq!(intent(135.0), DropIntent::After);
    }

    #[test]
    fn dragged_board_nests_into_folder_header() {
        let intent = compute_drop_intent(ItemKind::Board, ItemKind::Folder, false, 120.0, ROW);
        assert_eq!(intent, DropIntent::Inside);
    }

    #[test]
    fn nested_board_target_never_nests() {
        let intent = |y| compute_drop_intent(ItemKind::Board, ItemKind::Board, true, y, ROW);
        assert_eq!(intent(115.0), DropIntent::Before);
        assert_eq!(intent(125.0), DropIntent::After);
    }

    #[test]
    fn ratio_is_clamped_and_zero_height_is_safe() {
        let above = compute_drop_intent(ItemKind::Board, ItemKind::Board, false, -50.0, ROW);
        assert_eq!(above, DropIntent::Before);

        let flat = TargetRect {
            top: 10.0,
            height: 0.0,
        };
        let intent = compute_drop_intent(ItemKind::Board, ItemKind::Board, false, 10.0, flat);
        assert_eq!(intent, DropIntent::Before);
    }
}
