//! Category groups derived from note queries.
//!
//! # Responsibility
//! - Bucket matching notes by display category (`aggregate`).
//! - Order buckets for display (`sort`).
//!
//! # Invariants
//! - A `Group` never holds zero notes.
//! - Notes inside a group are ordered by `modified_at` DESC, then `id` DESC.
//! - Groups are recomputed on every refresh and carry no identity.

pub mod aggregate;
pub mod sort;

use crate::model::note::{NoteSummary, UNCATEGORIZED_LABEL};
use crate::repo::note_store::{NoteStore, RepoResult};
use crate::search::predicate::NotePredicate;
use aggregate::{aggregate, into_groups, AggregationStrategy};
use serde::{Deserialize, Serialize};
use sort::sort_groups;

/// One display bucket of the notes list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    pub notes: Vec<NoteSummary>,
}

impl Group {
    /// Whether this is the pinned bucket for notes without a category.
    pub fn is_uncategorized(&self) -> bool {
        self.label == UNCATEGORIZED_LABEL
    }

    /// Modification time of the newest note, the group's sort key.
    pub fn latest_modified(&self) -> Option<i64> {
        self.notes.first().map(|note| note.modified_at)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Runs the full notes pipeline: query, bucket, drop empties, sort.
pub fn load_groups<S>(
    store: &S,
    predicate: &NotePredicate,
    strategy: AggregationStrategy,
) -> RepoResult<Vec<Group>>
where
    S: NoteStore + ?Sized,
{
    let buckets = aggregate(store, predicate, strategy)?;
    Ok(sort_groups(into_groups(buckets)))
}
