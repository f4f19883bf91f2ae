//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence boundary consumed by board list services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`BoardNotFound`) in addition to
//!   DB transport errors.

pub mod board_repo;
