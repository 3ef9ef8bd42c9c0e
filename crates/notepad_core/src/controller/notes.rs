//! Notes list refresh controller.
//!
//! # Responsibility
//! - Hold the search text and category filter of one notes screen.
//! - Recompute groups on every state change or external mutation.
//!
//! # Invariants
//! - State mutation and ticket acquisition happen under one lock, so ticket
//!   order matches state order.
//! - Reserved todo categories are always excluded.
//! - A request already superseded when its task starts skips the store.

use crate::config::EngineConfig;
use crate::controller::dispatch_blocking;
use crate::controller::single_flight::{SingleFlight, Snapshot};
use crate::group::{load_groups, Group};
use crate::repo::note_store::NoteStore;
use crate::search::predicate::{build_predicate, CategoryFilter};
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Published notes list.
pub type NotesSnapshot = Snapshot<Vec<Group>>;

/// User-controlled inputs of the notes list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_text: String,
    pub category_filter: CategoryFilter,
}

pub struct NotesController<S: NoteStore + 'static> {
    store: Arc<S>,
    runtime: Handle,
    config: EngineConfig,
    state: Mutex<ViewState>,
    flight: Arc<SingleFlight<Vec<Group>>>,
}

impl<S: NoteStore + 'static> NotesController<S> {
    /// Creates a controller that schedules work on `runtime`.
    ///
    /// Nothing is loaded until the first `refresh` or state change.
    pub fn new(store: Arc<S>, runtime: Handle, config: EngineConfig) -> Self {
        Self {
            store,
            runtime,
            config,
            state: Mutex::new(ViewState::default()),
            flight: Arc::new(SingleFlight::new()),
        }
    }

    /// Updates the search text and schedules a recomputation.
    ///
    /// The handle resolves to whether this request's result was published.
    pub fn set_search_text(&self, text: impl Into<String>) -> JoinHandle<bool> {
        let text = text.into();
        self.dispatch(move |state| state.search_text = text)
    }

    /// Updates the category filter and schedules a recomputation.
    pub fn set_category_filter(&self, filter: CategoryFilter) -> JoinHandle<bool> {
        self.dispatch(move |state| state.category_filter = filter)
    }

    /// Recomputes with unchanged state, e.g. after an external edit.
    pub fn refresh(&self) -> JoinHandle<bool> {
        self.dispatch(|_| {})
    }

    pub fn view_state(&self) -> ViewState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last published snapshot.
    pub fn current(&self) -> NotesSnapshot {
        self.flight.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotesSnapshot> {
        self.flight.subscribe()
    }

    fn dispatch<F>(&self, mutate: F) -> JoinHandle<bool>
    where
        F: FnOnce(&mut ViewState),
    {
        let (state, ticket) = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            mutate(&mut *guard);
            (guard.clone(), self.flight.begin())
        };

        let store = Arc::clone(&self.store);
        let flight = Arc::clone(&self.flight);
        let strategy = self.config.aggregation;
        let timeout = self.config.refresh_timeout();

        self.runtime.spawn(async move {
            if !flight.is_current(ticket) {
                debug!("event=refresh_skipped module=controller view=notes generation={ticket}");
                return false;
            }

            let search_chars = state.search_text.chars().count();
            let predicate = build_predicate(&state.search_text, &state.category_filter, true);
            let outcome =
                dispatch_blocking(timeout, move || load_groups(&*store, &predicate, strategy))
                    .await;

            match &outcome {
                Ok(groups) => debug!(
                    "event=notes_refresh module=controller status=ok generation={ticket} groups={} search_chars={search_chars}",
                    groups.len()
                ),
                Err(err) => warn!(
                    "event=notes_refresh module=controller status=error generation={ticket} error={err}"
                ),
            }

            let published = flight.publish(ticket, outcome);
            if !published {
                debug!("event=refresh_discarded module=controller view=notes generation={ticket}");
            }
            published
        })
    }
}
