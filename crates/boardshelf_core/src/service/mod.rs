//! Board shelf services.
//!
//! # Responsibility
//! - Layer use-case behavior (index store, autosave, transfer) over the
//!   repository boundary.
//! - Keep host/UI code decoupled from storage details.

pub mod autosave;
pub mod index_store;
pub mod session;
pub mod transfer;
