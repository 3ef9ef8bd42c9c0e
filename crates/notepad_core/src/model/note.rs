//! Note domain model and category labels.
//!
//! # Responsibility
//! - Define the typed row shape exchanged with any `NoteStore`.
//! - Own the category label rules shared by aggregation and the todo view.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes.
//! - A missing or empty category displays as [`UNCATEGORIZED_LABEL`].
//! - [`TODO_PENDING`] and [`TODO_COMPLETED`] belong to the todo view only.

use serde::{Deserialize, Serialize};

/// Store-assigned note identifier.
pub type NoteId = i64;

/// Reserved category for todo notes that are not done yet.
pub const TODO_PENDING: &str = "todo_pending";
/// Reserved category for finished todo notes.
pub const TODO_COMPLETED: &str = "todo_completed";
/// Both reserved todo categories.
pub const RESERVED_CATEGORIES: [&str; 2] = [TODO_PENDING, TODO_COMPLETED];

/// Display label for notes without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
/// Category filter sentinel meaning "no restriction".
pub const ALL_CATEGORIES_LABEL: &str = "All";

/// Full note row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// `None` and `Some("")` both mean uncategorized.
    pub category: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub modified_at: i64,
}

impl NoteRow {
    /// Returns the label this note is grouped under.
    pub fn display_category(&self) -> &str {
        display_label(self.category.as_deref())
    }

    /// Projects the row into the list item shape.
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id,
            title: self.title.clone(),
            modified_at: self.modified_at,
            category: self.category.clone(),
        }
    }
}

/// List item projection used by groups and todo buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub modified_at: i64,
    pub category: Option<String>,
}

/// Field values for inserting a new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
    pub category: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl NewNote {
    /// Builds an insert payload stamped with `now` for both timestamps.
    pub fn at(
        now: i64,
        title: impl Into<String>,
        body: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub modified_at: Option<i64>,
}

impl NoteChanges {
    /// Returns whether applying these changes would touch no column.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.category.is_none()
            && self.modified_at.is_none()
    }
}

/// Distinct category value with the number of notes carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: u64,
}

/// Maps a stored category to its display label.
pub fn display_label(category: Option<&str>) -> &str {
    match category {
        Some(value) if !value.is_empty() => value,
        _ => UNCATEGORIZED_LABEL,
    }
}

/// Returns whether `category` is one of the todo-only labels.
pub fn is_reserved(category: &str) -> bool {
    RESERVED_CATEGORIES.contains(&category)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_empty_categories_display_as_uncategorized() {
        assert_eq!(display_label(None), UNCATEGORIZED_LABEL);
        assert_eq!(display_label(Some("")), UNCATEGORIZED_LABEL);
        assert_eq!(display_label(Some("Work")), "Work");
    }

    #[test]
    fn reserved_labels_are_detected_exactly() {
        assert!(is_reserved("todo_pending"));
        assert!(is_reserved("todo_completed"));
        assert!(!is_reserved("Todo_Pending"));
        assert!(!is_reserved("todo"));
    }
}
