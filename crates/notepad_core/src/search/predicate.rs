//! Predicate builder for note list queries.
//!
//! # Responsibility
//! - Turn (search text, category filter, reserved exclusion) into a typed
//!   predicate the store can execute.
//!
//! # Invariants
//! - Empty search text adds no text condition.
//! - Text matching is an unanchored substring test over title OR body that
//!   ignores ASCII case only, like SQLite's default `LIKE`.
//! - `Uncategorized` matches every category displayed under that label:
//!   missing, empty, or the literal label itself.

use crate::model::note::{
    display_label, is_reserved, NoteRow, ALL_CATEGORIES_LABEL, UNCATEGORIZED_LABEL,
};
use serde::{Deserialize, Serialize};

/// Category restriction selected by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    /// No restriction.
    #[default]
    All,
    /// Category is missing, empty, or literally `Uncategorized`.
    Uncategorized,
    /// Category equals this exact value.
    Exact(String),
}

impl CategoryFilter {
    /// Parses a label picked from the filter dialog.
    ///
    /// `"All"` and `"Uncategorized"` are the two sentinels; an empty label is
    /// treated as uncategorized.
    pub fn from_label(label: &str) -> Self {
        match label {
            ALL_CATEGORIES_LABEL => Self::All,
            UNCATEGORIZED_LABEL | "" => Self::Uncategorized,
            other => Self::Exact(other.to_string()),
        }
    }

    /// Builds the filter selecting exactly the notes grouped under `category`.
    pub fn for_category(category: Option<&str>) -> Self {
        match display_label(category) {
            UNCATEGORIZED_LABEL => Self::Uncategorized,
            value => Self::Exact(value.to_string()),
        }
    }

    /// Label shown for this filter.
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES_LABEL,
            Self::Uncategorized => UNCATEGORIZED_LABEL,
            Self::Exact(value) => value,
        }
    }

    fn accepts(&self, category: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Uncategorized => display_label(category) == UNCATEGORIZED_LABEL,
            Self::Exact(expected) => category == Some(expected.as_str()),
        }
    }
}

/// Filter expression consumed by `NoteStore::query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePredicate {
    /// Substring to look for in title or body; `None` matches everything.
    pub text: Option<String>,
    pub category: CategoryFilter,
    /// Drops notes whose category is a reserved todo label.
    pub exclude_reserved: bool,
}

impl NotePredicate {
    /// Predicate for one reserved (or any exact) category with no other rule.
    pub fn exact_category(category: &str) -> Self {
        Self {
            text: None,
            category: CategoryFilter::Exact(category.to_string()),
            exclude_reserved: false,
        }
    }

    /// Returns whether a free-text search is part of this predicate.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Evaluates the predicate against one row in memory.
    ///
    /// Stores must return exactly the rows for which this is `true`. Case is
    /// folded for ASCII letters only; `É` and `é` stay distinct.
    pub fn matches(&self, row: &NoteRow) -> bool {
        let category = row.category.as_deref();
        if self.exclude_reserved && category.is_some_and(is_reserved) {
            return false;
        }
        if !self.category.accepts(category) {
            return false;
        }
        match self.text.as_deref() {
            None => true,
            Some(needle) => {
                let needle = needle.to_ascii_lowercase();
                row.title.to_ascii_lowercase().contains(&needle)
                    || row.body.to_ascii_lowercase().contains(&needle)
            }
        }
    }
}

/// Builds the store predicate for the notes list.
pub fn build_predicate(
    search_text: &str,
    category: &CategoryFilter,
    exclude_reserved: bool,
) -> NotePredicate {
    let text = if search_text.is_empty() {
        None
    } else {
        Some(search_text.to_string())
    };

    NotePredicate {
        text,
        category: category.clone(),
        exclude_reserved,
    }
}
