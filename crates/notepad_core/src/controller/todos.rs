//! Todo view refresh controller.
//!
//! # Responsibility
//! - Publish the pending/completed buckets of one todo screen.
//! - Dispatch add/toggle mutations off the caller's thread and refresh after
//!   each successful one.
//!
//! # Invariants
//! - Blank content and duplicate toggles are rejected before dispatch.
//! - Mutations run one at a time behind an async gate.
//! - At most one toggle per note id is in flight; the store's
//!   compare-and-set covers writers outside this controller.

use crate::config::EngineConfig;
use crate::controller::dispatch_blocking;
use crate::controller::single_flight::{SingleFlight, Snapshot};
use crate::model::note::NoteId;
use crate::repo::note_store::{NoteStore, RepoError};
use crate::service::todo_service::{
    validate_todo_content, TodoBuckets, TodoError, TodoService, TodoStatus,
};
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Published todo buckets.
pub type TodoSnapshot = Snapshot<TodoBuckets>;

type InFlightSet = Arc<Mutex<HashSet<NoteId>>>;

/// Handle to a dispatched todo mutation.
#[must_use = "dropping the handle does not cancel the mutation, but loses its outcome"]
pub struct PendingMutation<T> {
    handle: JoinHandle<Result<T, TodoError>>,
}

impl<T> PendingMutation<T> {
    /// Waits for the mutation (and the refresh that follows it).
    pub async fn wait(self) -> Result<T, TodoError> {
        self.handle.await.map_err(|err| {
            TodoError::Repo(RepoError::Unavailable(format!(
                "mutation task failed: {err}"
            )))
        })?
    }
}

/// Removes the note id from the in-flight set when dropped.
struct ToggleClaim {
    id: NoteId,
    in_flight: InFlightSet,
}

impl ToggleClaim {
    fn acquire(in_flight: &InFlightSet, id: NoteId) -> Result<Self, TodoError> {
        let mut ids = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id) {
            return Err(TodoError::ToggleInFlight(id));
        }
        Ok(Self {
            id,
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for ToggleClaim {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct TodoController<S: NoteStore + 'static> {
    store: Arc<S>,
    runtime: Handle,
    timeout: Option<Duration>,
    flight: Arc<SingleFlight<TodoBuckets>>,
    write_gate: Arc<tokio::sync::Mutex<()>>,
    toggles_in_flight: InFlightSet,
}

impl<S: NoteStore + 'static> TodoController<S> {
    pub fn new(store: Arc<S>, runtime: Handle, config: &EngineConfig) -> Self {
        Self {
            store,
            runtime,
            timeout: config.refresh_timeout(),
            flight: Arc::new(SingleFlight::new()),
            write_gate: Arc::new(tokio::sync::Mutex::new(())),
            toggles_in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Reloads both buckets.
    pub fn refresh(&self) -> JoinHandle<bool> {
        let store = Arc::clone(&self.store);
        let flight = Arc::clone(&self.flight);
        let timeout = self.timeout;
        self.runtime
            .spawn(async move { reload_todos(store, flight, timeout).await })
    }

    /// Dispatches creation of a pending todo.
    ///
    /// # Errors
    /// - `EmptyContent` immediately, without touching the store.
    pub fn add_todo(&self, content: &str) -> Result<PendingMutation<NoteId>, TodoError> {
        let title = validate_todo_content(content)?.to_string();
        Ok(self.spawn_mutation(move |service| service.add_todo(&title)))
    }

    /// Dispatches a status flip for `id`.
    ///
    /// # Errors
    /// - `ToggleInFlight` immediately when a toggle for `id` is still running.
    pub fn toggle_status(&self, id: NoteId) -> Result<PendingMutation<TodoStatus>, TodoError> {
        let claim = ToggleClaim::acquire(&self.toggles_in_flight, id)?;
        Ok(self.spawn_mutation(move |service| {
            let _claim = claim;
            service.toggle_status(id)
        }))
    }

    /// Last published snapshot.
    pub fn current(&self) -> TodoSnapshot {
        self.flight.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoSnapshot> {
        self.flight.subscribe()
    }

    fn spawn_mutation<T, F>(&self, job: F) -> PendingMutation<T>
    where
        T: Send + 'static,
        F: FnOnce(&TodoService<Arc<S>>) -> Result<T, TodoError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let flight = Arc::clone(&self.flight);
        let gate = Arc::clone(&self.write_gate);
        let timeout = self.timeout;

        let handle = self.runtime.spawn(async move {
            let result = {
                let _permit = gate.lock().await;
                let service = TodoService::new(Arc::clone(&store));
                match tokio::task::spawn_blocking(move || job(&service)).await {
                    Ok(result) => result,
                    Err(err) => Err(TodoError::Repo(RepoError::Unavailable(format!(
                        "worker task failed: {err}"
                    )))),
                }
            };

            if result.is_ok() {
                reload_todos(store, flight, timeout).await;
            }
            result
        });

        PendingMutation { handle }
    }
}

async fn reload_todos<S: NoteStore + 'static>(
    store: Arc<S>,
    flight: Arc<SingleFlight<TodoBuckets>>,
    timeout: Option<Duration>,
) -> bool {
    let ticket = flight.begin();
    let outcome = dispatch_blocking(timeout, move || TodoService::new(store).load_todos()).await;

    match &outcome {
        Ok(todos) => debug!(
            "event=todos_refresh module=controller status=ok generation={ticket} pending={} completed={}",
            todos.pending_count, todos.completed_count
        ),
        Err(err) => warn!(
            "event=todos_refresh module=controller status=error generation={ticket} error={err}"
        ),
    }

    let published = flight.publish(ticket, outcome);
    if !published {
        debug!("event=refresh_discarded module=controller view=todos generation={ticket}");
    }
    published
}
