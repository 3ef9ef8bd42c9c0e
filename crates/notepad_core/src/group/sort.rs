//! Group sorter.
//!
//! # Invariants
//! - `Uncategorized` is pinned first when present.
//! - Remaining groups go newest-first by their first note's `modified_at`.
//! - Equal timestamps fall back to label ascending, so the order is total and
//!   re-sorting is idempotent.

use crate::group::Group;
use std::cmp::Ordering;

/// Sorts groups into display order.
pub fn sort_groups(mut groups: Vec<Group>) -> Vec<Group> {
    groups.sort_by(compare_groups);
    groups
}

/// Display order between two groups.
pub fn compare_groups(left: &Group, right: &Group) -> Ordering {
    match (left.is_uncategorized(), right.is_uncategorized()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => right
            .latest_modified()
            .cmp(&left.latest_modified())
            .then_with(|| left.label.cmp(&right.label)),
    }
}

#[cfg(test)]
mod tests {
    use super::sort_groups;
    use crate::group::Group;
    use crate::model::note::NoteSummary;

    fn group(label: &str, modified_at: i64) -> Group {
        Group {
            label: label.to_string(),
            notes: vec![NoteSummary {
                id: modified_at,
                title: label.to_string(),
                modified_at,
                category: Some(label.to_string()),
            }],
        }
    }

    fn labels(groups: &[Group]) -> Vec<&str> {
        groups.iter().map(|g| g.label.as_str()).collect()
    }

    #[test]
    fn uncategorized_is_pinned_even_when_oldest() {
        let sorted = sort_groups(vec![
            group("Work", 300),
            group("Uncategorized", 1),
            group("Home", 200),
        ]);
        assert_eq!(labels(&sorted), vec!["Uncategorized", "Work", "Home"]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_label() {
        let sorted = sort_groups(vec![group("b", 100), group("a", 100), group("c", 500)]);
        assert_eq!(labels(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn resorting_sorted_output_is_idempotent() {
        let once = sort_groups(vec![
            group("x", 5),
            group("Uncategorized", 9),
            group("y", 5),
            group("z", 7),
        ]);
        let twice = sort_groups(once.clone());
        assert_eq!(once, twice);
    }
}
