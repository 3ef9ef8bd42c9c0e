//! Query predicates for the notes list.
//!
//! # Responsibility
//! - Expose the predicate builder used by aggregation.
//! - Keep text/category filter semantics in one place for every store.

pub mod predicate;
