//! Note editing use-case service.
//!
//! # Responsibility
//! - Provide editor create/save/close/delete flows over a `NoteStore`.
//! - Derive a title from the body when the user left it blank.
//! - Offer category lists for autocompletion and the filter dialog.
//!
//! # Invariants
//! - Every save refreshes `modified_at`.
//! - Reserved todo categories are never assigned from the editor.
//! - A blank category, or the `Uncategorized` label itself, is stored as no
//!   category.
//! - A draft is validated before anything is written.

use crate::model::note::{
    display_label, is_reserved, now_millis, NewNote, NoteChanges, NoteId, NoteRow, ALL_CATEGORIES_LABEL,
    RESERVED_CATEGORIES, UNCATEGORIZED_LABEL,
};
use crate::repo::note_store::{NoteStore, RepoError, RepoResult};
use log::info;
use thiserror::Error;

const DERIVED_TITLE_MAX_CHARS: usize = 10;

/// Service error for note editing use-cases.
#[derive(Debug, Error)]
pub enum NoteServiceError {
    #[error("note not found: {0}")]
    NotFound(NoteId),
    /// Category is reserved for the todo view.
    #[error("category `{0}` is reserved for todos")]
    ReservedCategory(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Editor contents submitted on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub category: Option<String>,
}

/// What closing the editor did with the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    /// The note was deleted: an empty body, or a cancelled new note.
    Discarded,
    /// Editing was cancelled and the pre-edit contents were restored.
    Reverted,
}

/// Note editing facade over a note store.
pub struct NoteService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts an empty, uncategorized note and returns its id.
    pub fn create_note(&self) -> Result<NoteId, NoteServiceError> {
        let id = self.store.insert(&NewNote::at(now_millis(), "", "", None))?;
        info!("event=note_create module=note status=ok note_id={id}");
        Ok(id)
    }

    /// Validates `draft` and inserts it as a new note in one step.
    pub fn create_with(&self, draft: &NoteDraft) -> Result<NoteRow, NoteServiceError> {
        let category = normalize_category(draft.category.as_deref())?;
        let note = NewNote::at(
            now_millis(),
            derive_title(&draft.title, &draft.body),
            draft.body.as_str(),
            category,
        );
        let id = self.store.insert(&note)?;
        info!(
            "event=note_create module=note status=ok note_id={id} body_chars={}",
            draft.body.chars().count()
        );
        self.get_note(id)
    }

    pub fn get_note(&self, id: NoteId) -> Result<NoteRow, NoteServiceError> {
        self.store.get(id)?.ok_or(NoteServiceError::NotFound(id))
    }

    /// Writes the draft and returns the stored row.
    pub fn save_note(&self, id: NoteId, draft: &NoteDraft) -> Result<NoteRow, NoteServiceError> {
        let category = normalize_category(draft.category.as_deref())?;
        let changes = NoteChanges {
            title: Some(derive_title(&draft.title, &draft.body)),
            body: Some(draft.body.clone()),
            category: Some(category),
            modified_at: Some(now_millis()),
        };
        if self.store.update(id, &changes)? == 0 {
            return Err(NoteServiceError::NotFound(id));
        }

        info!(
            "event=note_save module=note status=ok note_id={id} body_chars={}",
            draft.body.chars().count()
        );
        self.get_note(id)
    }

    /// Applies editor-close semantics: empty body deletes, otherwise saves.
    pub fn finish_editing(
        &self,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<EditOutcome, NoteServiceError> {
        if draft.body.is_empty() {
            self.delete_note(id)?;
            return Ok(EditOutcome::Discarded);
        }

        self.save_note(id, draft)?;
        Ok(EditOutcome::Saved)
    }

    /// Abandons an editing session.
    ///
    /// `original` is the row as loaded when editing began; it is written back
    /// unchanged, `modified_at` included. `None` marks a note created for this
    /// session, which is deleted instead.
    pub fn cancel_editing(
        &self,
        id: NoteId,
        original: Option<&NoteRow>,
    ) -> Result<EditOutcome, NoteServiceError> {
        let Some(original) = original else {
            self.delete_note(id)?;
            return Ok(EditOutcome::Discarded);
        };

        let changes = NoteChanges {
            title: Some(original.title.clone()),
            body: Some(original.body.clone()),
            category: Some(original.category.clone()),
            modified_at: Some(original.modified_at),
        };
        if self.store.update(id, &changes)? == 0 {
            return Err(NoteServiceError::NotFound(id));
        }
        info!("event=note_revert module=note status=ok note_id={id}");
        Ok(EditOutcome::Reverted)
    }

    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        if self.store.delete(id)? == 0 {
            return Err(NoteServiceError::NotFound(id));
        }
        info!("event=note_delete module=note status=ok note_id={id}");
        Ok(())
    }

    /// Moves a note to another category (`None` or blank clears it).
    pub fn set_category(
        &self,
        id: NoteId,
        category: Option<&str>,
    ) -> Result<(), NoteServiceError> {
        let changes = NoteChanges {
            category: Some(normalize_category(category)?),
            modified_at: Some(now_millis()),
            ..NoteChanges::default()
        };
        if self.store.update(id, &changes)? == 0 {
            return Err(NoteServiceError::NotFound(id));
        }
        Ok(())
    }

    /// Distinct user categories, sorted, for editor autocompletion.
    pub fn category_suggestions(&self) -> RepoResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .store
            .distinct_categories(&RESERVED_CATEGORIES)?
            .into_iter()
            .filter_map(|entry| entry.category)
            .filter(|category| display_label(Some(category.as_str())) != UNCATEGORIZED_LABEL)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Choices of the category filter dialog.
    ///
    /// `All` comes first, then user categories; `Uncategorized` is appended
    /// only when such notes exist.
    pub fn filter_choices(&self) -> RepoResult<Vec<String>> {
        let entries = self.store.distinct_categories(&RESERVED_CATEGORIES)?;
        let (uncategorized, named): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| display_label(entry.category.as_deref()) == UNCATEGORIZED_LABEL);

        let mut categories: Vec<String> =
            named.into_iter().filter_map(|entry| entry.category).collect();
        categories.sort();
        categories.dedup();

        let mut choices = Vec::with_capacity(categories.len() + 2);
        choices.push(ALL_CATEGORIES_LABEL.to_string());
        choices.extend(categories);
        if !uncategorized.is_empty() {
            choices.push(UNCATEGORIZED_LABEL.to_string());
        }
        Ok(choices)
    }
}

/// Returns `title`, or a prefix of `body` when the title is blank.
///
/// The prefix is the first 10 characters; when the body is longer, it is cut
/// back to the last space inside that prefix unless the space is leading.
pub fn derive_title(title: &str, body: &str) -> String {
    if !title.trim().is_empty() || body.is_empty() {
        return title.to_string();
    }

    let prefix: String = body.chars().take(DERIVED_TITLE_MAX_CHARS).collect();
    if body.chars().count() > DERIVED_TITLE_MAX_CHARS {
        if let Some(last_space) = prefix.rfind(' ').filter(|pos| *pos > 0) {
            return prefix[..last_space].to_string();
        }
    }
    prefix
}

fn normalize_category(category: Option<&str>) -> Result<Option<String>, NoteServiceError> {
    match category.map(str::trim) {
        None | Some("") | Some(UNCATEGORIZED_LABEL) => Ok(None),
        Some(value) if is_reserved(value) => {
            Err(NoteServiceError::ReservedCategory(value.to_string()))
        }
        Some(value) => Ok(Some(value.to_string())),
    }
}
