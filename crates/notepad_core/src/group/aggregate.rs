//! Aggregator: runs a predicate and buckets rows by category label.
//!
//! # Responsibility
//! - Execute the notes query with one of two equivalent strategies.
//! - Produce label -> newest-first note lists with empty buckets dropped.
//!
//! # Invariants
//! - Text search always runs as one global query, bucketed locally.
//! - Both strategies yield identical buckets for the same store contents.

use crate::group::Group;
use crate::model::note::{NoteRow, NoteSummary, RESERVED_CATEGORIES};
use crate::repo::note_store::{NoteOrder, NoteStore, RepoResult};
use crate::search::predicate::{CategoryFilter, NotePredicate};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Label -> notes mapping produced by [`aggregate`].
pub type CategoryBuckets = BTreeMap<String, Vec<NoteSummary>>;

/// How the no-search notes list is fetched from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Discover categories first, then query each one.
    #[default]
    PerCategory,
    /// Query once and bucket locally.
    SingleQuery,
}

/// Executes `predicate` and buckets the matches by display label.
pub fn aggregate<S>(
    store: &S,
    predicate: &NotePredicate,
    strategy: AggregationStrategy,
) -> RepoResult<CategoryBuckets>
where
    S: NoteStore + ?Sized,
{
    let rows = if predicate.has_text() || strategy == AggregationStrategy::SingleQuery {
        store.query(predicate, NoteOrder::ModifiedDesc)?
    } else {
        query_per_category(store, predicate)?
    };
    Ok(bucket_rows(rows))
}

/// Converts buckets into unsorted groups.
pub fn into_groups(buckets: CategoryBuckets) -> Vec<Group> {
    buckets
        .into_iter()
        .filter(|(_, notes)| !notes.is_empty())
        .map(|(label, notes)| Group { label, notes })
        .collect()
}

fn query_per_category<S>(store: &S, predicate: &NotePredicate) -> RepoResult<Vec<NoteRow>>
where
    S: NoteStore + ?Sized,
{
    let exclude: &[&str] = if predicate.exclude_reserved {
        &RESERVED_CATEGORIES
    } else {
        &[]
    };

    // NULL and '' both land in the uncategorized filter; query it once.
    let mut filters: Vec<CategoryFilter> = Vec::new();
    for entry in store.distinct_categories(exclude)? {
        let filter = CategoryFilter::for_category(entry.category.as_deref());
        let admitted = predicate.category == CategoryFilter::All || predicate.category == filter;
        if admitted && !filters.contains(&filter) {
            filters.push(filter);
        }
    }

    let mut rows = Vec::new();
    for filter in filters {
        let per_category = NotePredicate {
            text: None,
            category: filter,
            exclude_reserved: predicate.exclude_reserved,
        };
        rows.extend(store.query(&per_category, NoteOrder::ModifiedDesc)?);
    }
    Ok(rows)
}

fn bucket_rows(rows: Vec<NoteRow>) -> CategoryBuckets {
    let mut buckets = CategoryBuckets::new();
    for row in rows {
        buckets
            .entry(row.display_category().to_string())
            .or_default()
            .push(row.summary());
    }

    for notes in buckets.values_mut() {
        notes.sort_by_key(|note| (Reverse(note.modified_at), Reverse(note.id)));
    }
    buckets.retain(|_, notes| !notes.is_empty());
    buckets
}
