//! Todo use-case service.
//!
//! # Responsibility
//! - Load the fixed pending/completed buckets.
//! - Add todos and flip their status.
//!
//! # Invariants
//! - A todo is a note whose category is `todo_pending` or `todo_completed`.
//! - Blank todo content never reaches the store.
//! - A toggle only applies if the category read is still current at write
//!   time (store-level compare-and-set).

use crate::model::note::{
    now_millis, NewNote, NoteId, NoteSummary, TODO_COMPLETED, TODO_PENDING,
};
use crate::repo::note_store::{NoteOrder, NoteStore, RepoError, RepoResult};
use crate::search::predicate::NotePredicate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display label of the pending bucket.
pub const PENDING_LABEL: &str = "Pending";
/// Display label of the completed bucket.
pub const COMPLETED_LABEL: &str = "Completed";

/// Todo lifecycle state, stored as a reserved category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    Completed,
}

impl TodoStatus {
    /// Reserved category persisted for this status.
    pub fn category(self) -> &'static str {
        match self {
            Self::Pending => TODO_PENDING,
            Self::Completed => TODO_COMPLETED,
        }
    }

    /// Parses a stored category; non-todo categories yield `None`.
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            TODO_PENDING => Some(Self::Pending),
            TODO_COMPLETED => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Bucket label shown for this status.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => PENDING_LABEL,
            Self::Completed => COMPLETED_LABEL,
        }
    }
}

/// The two todo buckets. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoBuckets {
    pub pending: Vec<NoteSummary>,
    pub completed: Vec<NoteSummary>,
    pub pending_count: usize,
    pub completed_count: usize,
}

impl TodoBuckets {
    /// Both buckets in display order, paired with their labels.
    pub fn buckets(&self) -> [(&'static str, &[NoteSummary]); 2] {
        [
            (PENDING_LABEL, self.pending.as_slice()),
            (COMPLETED_LABEL, self.completed.as_slice()),
        ]
    }
}

/// Service error for todo use-cases.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Content was empty or whitespace only.
    #[error("todo content must not be blank")]
    EmptyContent,
    /// The note exists but is not a todo.
    #[error("note {id} is not a todo (category `{category}`)")]
    InvalidState { id: NoteId, category: String },
    #[error("todo not found: {0}")]
    NotFound(NoteId),
    /// Another writer changed the status between read and write.
    #[error("todo {0} was modified concurrently")]
    Conflict(NoteId),
    /// A toggle for the same note is already dispatched.
    #[error("a status toggle for todo {0} is already in flight")]
    ToggleInFlight(NoteId),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Rejects blank todo content and returns the trimmed text.
pub fn validate_todo_content(content: &str) -> Result<&str, TodoError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TodoError::EmptyContent);
    }
    Ok(trimmed)
}

/// Todo service facade over a note store.
pub struct TodoService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> TodoService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads both buckets in the store's default order.
    pub fn load_todos(&self) -> RepoResult<TodoBuckets> {
        let pending = self.load_bucket(TodoStatus::Pending)?;
        let completed = self.load_bucket(TodoStatus::Completed)?;
        Ok(TodoBuckets {
            pending_count: pending.len(),
            completed_count: completed.len(),
            pending,
            completed,
        })
    }

    /// Creates a pending todo titled `content`.
    pub fn add_todo(&self, content: &str) -> Result<NoteId, TodoError> {
        let title = validate_todo_content(content)?;
        let note = NewNote::at(now_millis(), title, "", Some(TODO_PENDING.to_string()));
        let id = self.store.insert(&note)?;
        info!("event=todo_add module=todo status=ok note_id={id}");
        Ok(id)
    }

    /// Flips a todo between pending and completed and returns the new status.
    ///
    /// # Errors
    /// - `NotFound` when the note does not exist.
    /// - `InvalidState` when the note is not a todo; nothing is written.
    /// - `Conflict` when a concurrent writer changed the status first.
    pub fn toggle_status(&self, id: NoteId) -> Result<TodoStatus, TodoError> {
        let row = self.store.get(id)?.ok_or(TodoError::NotFound(id))?;
        let current = match row.category.as_deref().and_then(TodoStatus::from_category) {
            Some(status) => status,
            None => {
                return Err(TodoError::InvalidState {
                    id,
                    category: row.category.unwrap_or_default(),
                });
            }
        };

        let next = current.toggled();
        let changed =
            self.store
                .compare_and_set_category(id, current.category(), next.category(), now_millis())?;
        if changed == 0 {
            warn!("event=todo_toggle module=todo status=conflict note_id={id}");
            return Err(TodoError::Conflict(id));
        }

        info!(
            "event=todo_toggle module=todo status=ok note_id={id} from={} to={}",
            current.category(),
            next.category()
        );
        Ok(next)
    }

    fn load_bucket(&self, status: TodoStatus) -> RepoResult<Vec<NoteSummary>> {
        let predicate = NotePredicate::exact_category(status.category());
        let rows = self.store.query(&predicate, NoteOrder::Default)?;
        Ok(rows.iter().map(|row| row.summary()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_todo_content, TodoError, TodoStatus};

    #[test]
    fn blank_content_is_rejected() {
        assert!(matches!(
            validate_todo_content("   \t"),
            Err(TodoError::EmptyContent)
        ));
        assert_eq!(validate_todo_content(" Call mom ").unwrap(), "Call mom");
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        for status in [TodoStatus::Pending, TodoStatus::Completed] {
            assert_eq!(status.toggled().toggled(), status);
            assert_eq!(TodoStatus::from_category(status.category()), Some(status));
        }
        assert_eq!(TodoStatus::from_category("Work"), None);
    }
}
