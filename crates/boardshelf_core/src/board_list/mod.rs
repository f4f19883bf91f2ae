//! Board list ordering and consistency engine.
//!
//! # Responsibility
//! - Keep the ordered board/folder list well-formed (`normalize`).
//! - Translate drag gestures into reorder/grouping candidates (`drag`).
//! - Hold process-local list view state (`view_state`).
//!
//! # Invariants
//! - Everything here is pure or owns only in-memory state; persistence is
//!   the store's job.

pub mod drag;
pub mod normalize;
pub mod view_state;

pub use drag::{
    apply_drop, compute_drop_intent, ActiveDrag, DragReorderEngine, DragState, DropIntent,
    DropOutcome, DropTarget, HoverTarget, TargetRect,
};
pub use normalize::{distinct_board_count, is_normalized, normalize};
pub use view_state::FolderViewState;
