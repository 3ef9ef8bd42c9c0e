//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the query/update façade the engine consumes (`NoteStore`).
//! - Compile typed predicates to SQL inside the persistence boundary.
//!
//! # Invariants
//! - Rows are decoded once here; callers only see `NoteRow`.
//! - Reserved-category exclusion keeps rows whose category is NULL.
//! - Search text is matched as a literal substring (`LIKE` wildcards escaped).
//! - `compare_and_set_category` is a single conditional `UPDATE`.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{
    CategoryCount, NewNote, NoteChanges, NoteId, NoteRow, RESERVED_CATEGORIES, UNCATEGORIZED_LABEL,
};
use crate::search::predicate::{CategoryFilter, NotePredicate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    category,
    created_at,
    modified_at
FROM notes";

const NOTE_COLUMNS: [&str; 6] = ["id", "title", "body", "category", "created_at", "modified_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store failure taxonomy. Every variant is recoverable by callers.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted note data: {0}")]
    InvalidData(String),
    #[error("note store unavailable: {0}")]
    Unavailable(String),
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result ordering understood by every store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteOrder {
    /// The store's declared default: creation order, oldest first.
    #[default]
    Default,
    /// Most recently modified first, ties by id descending.
    ModifiedDesc,
}

/// Synchronous note persistence façade.
///
/// Implementations must be shareable across worker threads; each call is one
/// round trip and may block.
pub trait NoteStore: Send + Sync {
    /// Returns every row matching `predicate` in `order`.
    fn query(&self, predicate: &NotePredicate, order: NoteOrder) -> RepoResult<Vec<NoteRow>>;
    /// Loads one row by id.
    fn get(&self, id: NoteId) -> RepoResult<Option<NoteRow>>;
    /// Inserts one row and returns the assigned id.
    fn insert(&self, note: &NewNote) -> RepoResult<NoteId>;
    /// Applies a partial update and returns the affected row count.
    fn update(&self, id: NoteId, changes: &NoteChanges) -> RepoResult<usize>;
    /// Sets `category = new` only while it still equals `expected`.
    ///
    /// Returns the affected row count; `0` means the note is gone or another
    /// writer changed its category first.
    fn compare_and_set_category(
        &self,
        id: NoteId,
        expected: &str,
        new: &str,
        modified_at: i64,
    ) -> RepoResult<usize>;
    /// Deletes one row and returns the affected row count.
    fn delete(&self, id: NoteId) -> RepoResult<usize>;
    /// Lists distinct category values (NULL included) outside `exclude`.
    fn distinct_categories(&self, exclude: &[&str]) -> RepoResult<Vec<CategoryCount>>;
}

impl<S: NoteStore + ?Sized> NoteStore for Arc<S> {
    fn query(&self, predicate: &NotePredicate, order: NoteOrder) -> RepoResult<Vec<NoteRow>> {
        (**self).query(predicate, order)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<NoteRow>> {
        (**self).get(id)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        (**self).insert(note)
    }

    fn update(&self, id: NoteId, changes: &NoteChanges) -> RepoResult<usize> {
        (**self).update(id, changes)
    }

    fn compare_and_set_category(
        &self,
        id: NoteId,
        expected: &str,
        new: &str,
        modified_at: i64,
    ) -> RepoResult<usize> {
        (**self).compare_and_set_category(id, expected, new, modified_at)
    }

    fn delete(&self, id: NoteId) -> RepoResult<usize> {
        (**self).delete(id)
    }

    fn distinct_categories(&self, exclude: &[&str]) -> RepoResult<Vec<CategoryCount>> {
        (**self).distinct_categories(exclude)
    }
}

/// SQLite-backed note store owning one connection.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_migrated(open_db(path)?))
    }

    /// Opens a fresh private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_migrated(open_db_in_memory()?))
    }

    /// Wraps a caller-provided connection after checking the notes schema.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        ensure_notes_table_ready(&conn)?;
        Ok(Self::from_migrated(conn))
    }

    fn from_migrated(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl NoteStore for SqliteNoteStore {
    fn query(&self, predicate: &NotePredicate, order: NoteOrder) -> RepoResult<Vec<NoteRow>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        push_predicate(&mut sql, &mut bind_values, predicate);
        sql.push_str(match order {
            NoteOrder::Default => " ORDER BY created_at ASC, id ASC",
            NoteOrder::ModifiedDesc => " ORDER BY modified_at DESC, id DESC",
        });

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<NoteRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notes (title, body, category, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.title.as_str(),
                note.body.as_str(),
                note.category.as_deref(),
                note.created_at,
                note.modified_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, id: NoteId, changes: &NoteChanges) -> RepoResult<usize> {
        let conn = self.lock()?;
        if changes.is_empty() {
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
                [id],
                |row| row.get(0),
            )?;
            return Ok(usize::from(exists == 1));
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = changes.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(body) = changes.body.as_ref() {
            assignments.push("body = ?");
            bind_values.push(Value::Text(body.clone()));
        }
        if let Some(category) = changes.category.as_ref() {
            assignments.push("category = ?");
            bind_values.push(category.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(modified_at) = changes.modified_at {
            assignments.push("modified_at = ?");
            bind_values.push(Value::Integer(modified_at));
        }
        bind_values.push(Value::Integer(id));

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
        let changed = conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn compare_and_set_category(
        &self,
        id: NoteId,
        expected: &str,
        new: &str,
        modified_at: i64,
    ) -> RepoResult<usize> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE notes
             SET
                category = ?3,
                modified_at = ?4
             WHERE id = ?1
               AND category = ?2;",
            params![id, expected, new, modified_at],
        )?;
        Ok(changed)
    }

    fn delete(&self, id: NoteId) -> RepoResult<usize> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    fn distinct_categories(&self, exclude: &[&str]) -> RepoResult<Vec<CategoryCount>> {
        let mut sql = String::from("SELECT category, COUNT(*) AS count FROM notes");
        let bind_values: Vec<Value> = exclude
            .iter()
            .map(|value| Value::Text((*value).to_string()))
            .collect();
        if !exclude.is_empty() {
            let placeholders = vec!["?"; exclude.len()].join(", ");
            sql.push_str(&format!(
                " WHERE (category IS NULL OR category NOT IN ({placeholders}))"
            ));
        }
        sql.push_str(" GROUP BY category ORDER BY category ASC;");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            let count: i64 = row.get("count")?;
            let count = u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative category count `{count}`")))?;
            categories.push(CategoryCount {
                category: row.get("category")?,
                count,
            });
        }
        Ok(categories)
    }
}

fn push_predicate(sql: &mut String, bind_values: &mut Vec<Value>, predicate: &NotePredicate) {
    if predicate.exclude_reserved {
        sql.push_str(" AND (category IS NULL OR category NOT IN (?, ?))");
        for reserved in RESERVED_CATEGORIES {
            bind_values.push(Value::Text(reserved.to_string()));
        }
    }

    match &predicate.category {
        CategoryFilter::All => {}
        CategoryFilter::Uncategorized => {
            sql.push_str(" AND (category IS NULL OR category = '' OR category = ?)");
            bind_values.push(Value::Text(UNCATEGORIZED_LABEL.to_string()));
        }
        CategoryFilter::Exact(category) => {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.clone()));
        }
    }

    if let Some(text) = predicate.text.as_deref() {
        let pattern = format!("%{}%", escape_like(text));
        sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR body LIKE ? ESCAPE '\\')");
        bind_values.push(Value::Text(pattern.clone()));
        bind_values.push(Value::Text(pattern));
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<NoteRow> {
    Ok(NoteRow {
        id: row.get("id")?,
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        body: row.get::<_, Option<String>>("body")?.unwrap_or_default(),
        category: row.get("category")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    })
}

fn ensure_notes_table_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in NOTE_COLUMNS {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
