use notepad_core::{
    CategoryCount, NewNote, NoteChanges, NoteId, NoteOrder, NotePredicate, NoteRow, NoteStore,
    RepoResult, SqliteNoteStore, TodoError, TodoService, TodoStatus, TODO_COMPLETED, TODO_PENDING,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn call_mom_moves_between_buckets() {
    let service = TodoService::new(SqliteNoteStore::open_in_memory().unwrap());

    let id = service.add_todo("Call mom").unwrap();
    let todos = service.load_todos().unwrap();
    assert_eq!(todos.pending_count, 1);
    assert_eq!(todos.completed_count, 0);
    assert_eq!(todos.pending[0].id, id);
    assert_eq!(todos.pending[0].title, "Call mom");
    assert_eq!(todos.pending[0].category.as_deref(), Some(TODO_PENDING));

    assert_eq!(service.toggle_status(id).unwrap(), TodoStatus::Completed);
    let todos = service.load_todos().unwrap();
    assert_eq!((todos.pending_count, todos.completed_count), (0, 1));
    assert_eq!(todos.completed[0].id, id);

    assert_eq!(service.toggle_status(id).unwrap(), TodoStatus::Pending);
    let todos = service.load_todos().unwrap();
    assert_eq!((todos.pending_count, todos.completed_count), (1, 0));
}

#[test]
fn buckets_use_creation_order() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let first = store
        .insert(&NewNote::at(10, "first", "", Some(TODO_PENDING.to_string())))
        .unwrap();
    let second = store
        .insert(&NewNote::at(20, "second", "", Some(TODO_PENDING.to_string())))
        .unwrap();
    store
        .update(
            first,
            &NoteChanges {
                modified_at: Some(99),
                ..NoteChanges::default()
            },
        )
        .unwrap();

    let todos = TodoService::new(store).load_todos().unwrap();
    let ids: Vec<NoteId> = todos.pending.iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn toggle_refreshes_modified_at() {
    let store = Arc::new(SqliteNoteStore::open_in_memory().unwrap());
    let id = store
        .insert(&NewNote::at(1, "old", "", Some(TODO_PENDING.to_string())))
        .unwrap();

    TodoService::new(Arc::clone(&store)).toggle_status(id).unwrap();
    let row = store.get(id).unwrap().unwrap();
    assert_eq!(row.category.as_deref(), Some(TODO_COMPLETED));
    assert!(row.modified_at > 1);
    assert_eq!(row.created_at, 1);
}

#[test]
fn toggling_a_regular_note_is_invalid_and_leaves_it_unchanged() {
    let store = Arc::new(SqliteNoteStore::open_in_memory().unwrap());
    let id = store
        .insert(&NewNote::at(5, "Meeting notes", "", Some("Work".to_string())))
        .unwrap();

    let err = TodoService::new(Arc::clone(&store))
        .toggle_status(id)
        .unwrap_err();
    match err {
        TodoError::InvalidState { id: failed, category } => {
            assert_eq!(failed, id);
            assert_eq!(category, "Work");
        }
        other => panic!("unexpected error: {other}"),
    }

    let row = store.get(id).unwrap().unwrap();
    assert_eq!(row.category.as_deref(), Some("Work"));
    assert_eq!(row.modified_at, 5);
}

#[test]
fn toggling_missing_note_is_not_found() {
    let service = TodoService::new(SqliteNoteStore::open_in_memory().unwrap());
    assert!(matches!(
        service.toggle_status(77),
        Err(TodoError::NotFound(77))
    ));
}

/// Counts inserts so validation can be shown to stop before the store.
struct CountingStore {
    inner: SqliteNoteStore,
    inserts: AtomicUsize,
}

impl NoteStore for CountingStore {
    fn query(&self, predicate: &NotePredicate, order: NoteOrder) -> RepoResult<Vec<NoteRow>> {
        self.inner.query(predicate, order)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<NoteRow>> {
        self.inner.get(id)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(note)
    }

    fn update(&self, id: NoteId, changes: &NoteChanges) -> RepoResult<usize> {
        self.inner.update(id, changes)
    }

    fn compare_and_set_category(
        &self,
        id: NoteId,
        expected: &str,
        new: &str,
        modified_at: i64,
    ) -> RepoResult<usize> {
        self.inner
            .compare_and_set_category(id, expected, new, modified_at)
    }

    fn delete(&self, id: NoteId) -> RepoResult<usize> {
        self.inner.delete(id)
    }

    fn distinct_categories(&self, exclude: &[&str]) -> RepoResult<Vec<CategoryCount>> {
        self.inner.distinct_categories(exclude)
    }
}

#[test]
fn blank_todo_content_never_reaches_the_store() {
    let store = Arc::new(CountingStore {
        inner: SqliteNoteStore::open_in_memory().unwrap(),
        inserts: AtomicUsize::new(0),
    });
    let service = TodoService::new(Arc::clone(&store));

    for content in ["", "   ", "\n\t"] {
        assert!(matches!(
            service.add_todo(content),
            Err(TodoError::EmptyContent)
        ));
    }
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);

    let id = service.add_todo("  Call mom  ").unwrap();
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert_eq!(store.inner.get(id).unwrap().unwrap().title, "Call mom");
}

/// Holds every reader at a barrier so two toggles read the same state.
struct LockstepStore {
    inner: SqliteNoteStore,
    barrier: Barrier,
}

impl NoteStore for LockstepStore {
    fn query(&self, predicate: &NotePredicate, order: NoteOrder) -> RepoResult<Vec<NoteRow>> {
        self.inner.query(predicate, order)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<NoteRow>> {
        let row = self.inner.get(id);
        self.barrier.wait();
        row
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.inner.insert(note)
    }

    fn update(&self, id: NoteId, changes: &NoteChanges) -> RepoResult<usize> {
        self.inner.update(id, changes)
    }

    fn compare_and_set_category(
        &self,
        id: NoteId,
        expected: &str,
        new: &str,
        modified_at: i64,
    ) -> RepoResult<usize> {
        self.inner
            .compare_and_set_category(id, expected, new, modified_at)
    }

    fn delete(&self, id: NoteId) -> RepoResult<usize> {
        self.inner.delete(id)
    }

    fn distinct_categories(&self, exclude: &[&str]) -> RepoResult<Vec<CategoryCount>> {
        self.inner.distinct_categories(exclude)
    }
}

#[test]
fn concurrent_toggles_flip_exactly_once() {
    let inner = SqliteNoteStore::open_in_memory().unwrap();
    let id = inner
        .insert(&NewNote::at(1, "Call mom", "", Some(TODO_PENDING.to_string())))
        .unwrap();
    let store = Arc::new(LockstepStore {
        inner,
        barrier: Barrier::new(2),
    });

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || TodoService::new(store).toggle_status(id))
        })
        .collect();
    let outcomes: Vec<Result<TodoStatus, TodoError>> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    let applied = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Ok(TodoStatus::Completed)))
        .count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(TodoError::Conflict(conflicted)) if *conflicted == id))
        .count();
    assert_eq!((applied, conflicts), (1, 1));

    let row = store.inner.get(id).unwrap().unwrap();
    assert_eq!(row.category.as_deref(), Some(TODO_COMPLETED));
}
