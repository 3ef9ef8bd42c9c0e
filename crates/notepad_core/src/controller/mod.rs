//! Refresh controllers for the notes list and the todo view.
//!
//! # Responsibility
//! - Own per-screen view state and the last published snapshot.
//! - Run every store round trip on the blocking pool, never on the caller.
//!
//! # Invariants
//! - Recomputations are single-flight, last-write-wins (see `single_flight`).
//! - A failed recomputation publishes an empty snapshot with `error=true`.
//! - Each screen owns its own controller; nothing here is process-global.

pub mod notes;
pub mod single_flight;
pub mod todos;

use crate::repo::note_store::{RepoError, RepoResult};
use std::time::Duration;

pub use notes::{NotesController, NotesSnapshot, ViewState};
pub use single_flight::{SingleFlight, Snapshot};
pub use todos::{PendingMutation, TodoController, TodoSnapshot};

/// Runs `job` on the blocking pool, optionally bounded by `timeout`.
async fn dispatch_blocking<T, F>(timeout: Option<Duration>, job: F) -> RepoResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RepoResult<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
            RepoError::Unavailable(format!("store call exceeded {}ms", limit.as_millis()))
        })?,
        None => handle.await,
    };
    joined.map_err(|err| RepoError::Unavailable(format!("worker task failed: {err}")))?
}
