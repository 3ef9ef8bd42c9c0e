//! Note domain model shared by the store, aggregation and todo projections.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one note shape for the notes list and the todo view.
//!
//! # Invariants
//! - Every note is identified by a store-assigned `NoteId`.
//! - Groups and todo buckets are derived snapshots and are never stored.

pub mod note;
