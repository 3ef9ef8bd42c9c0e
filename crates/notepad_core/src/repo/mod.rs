//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note store contract consumed by aggregation and services.
//! - Isolate SQLite query details from orchestration code.
//!
//! # Invariants
//! - Store APIs report missing rows as `None` or zero affected rows, never as
//!   an error; `RepoError` covers transport, schema and availability faults.
//! - Mutations report affected row counts; interpreting zero is the caller's
//!   job.

pub mod note_store;
