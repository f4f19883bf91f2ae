//! Domain model for the board list, canvas snapshots and export bundles.
//!
//! # Responsibility
//! - Define canonical data structures shared by storage, the drag engine,
//!   the autosave bridge and the import/export pipeline.
//!
//! # Invariants
//! - Every board is identified by a stable opaque `BoardId`.
//! - Snapshot payloads are opaque to core; only fingerprints are inspected.

pub mod board;
pub mod bundle;
pub mod snapshot;
