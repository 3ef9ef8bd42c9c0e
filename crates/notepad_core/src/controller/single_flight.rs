//! Generation-ticketed publisher for recomputed snapshots.
//!
//! # Invariants
//! - Tickets are strictly increasing; each request takes one before it runs.
//! - A result is published only if its ticket is still the newest one when
//!   the channel's write lock is held, so an older request can never
//!   overwrite the result of a newer one.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Published view data plus failure flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot<T> {
    pub data: T,
    /// The last recomputation failed; `data` is empty.
    pub error: bool,
    /// Ticket of the request that produced this snapshot; `0` before the
    /// first publish.
    pub generation: u64,
}

pub struct SingleFlight<T> {
    latest: AtomicU64,
    tx: watch::Sender<Snapshot<T>>,
}

impl<T: Default> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> SingleFlight<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self {
            latest: AtomicU64::new(0),
            tx,
        }
    }

    /// Starts a request and returns its ticket, superseding older ones.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether no newer request has started since `ticket`.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Publishes `outcome` unless a newer request has started.
    ///
    /// Errors publish `T::default()` with `error=true`. Returns whether the
    /// snapshot was replaced.
    pub fn publish<E>(&self, ticket: u64, outcome: Result<T, E>) -> bool {
        let latest = &self.latest;
        self.tx.send_if_modified(|current| {
            if latest.load(Ordering::SeqCst) != ticket || current.generation >= ticket {
                return false;
            }
            *current = match outcome {
                Ok(data) => Snapshot {
                    data,
                    error: false,
                    generation: ticket,
                },
                Err(_) => Snapshot {
                    data: T::default(),
                    error: true,
                    generation: ticket,
                },
            };
            true
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> SingleFlight<T> {
    /// Clone of the last published snapshot.
    pub fn current(&self) -> Snapshot<T> {
        (*self.tx.borrow()).clone()
    }
}
