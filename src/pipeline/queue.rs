//! Bounded task queue.
//!
//! Runs a sequence of asynchronous actions with at most `limit` in flight.
//! Scheduling is a sliding window: a finished action frees its slot for the
//! next one immediately, so no slot sits idle while work remains.
//!
//! The first failing action fails the whole queue. Actions already started
//! are spawned tasks and keep running to completion in the background; their
//! results are simply no longer observed.

use crate::error::panic_message;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use thiserror::Error;
use tokio::task::JoinError;

/// Why a queue run stopped early.
#[derive(Debug, Error)]
pub enum QueueError<E> {
    #[error("queued action failed: {0}")]
    Action(E),

    #[error("queued action panicked: {0}")]
    Panicked(String),

    #[error("queued action was cancelled")]
    Cancelled,
}

impl<E> From<JoinError> for QueueError<E> {
    fn from(e: JoinError) -> Self {
        if e.is_panic() {
            QueueError::Panicked(panic_message(e.into_panic().as_ref()))
        } else {
            QueueError::Cancelled
        }
    }
}

/// Run `actions` with at most `limit` concurrently in flight.
///
/// Each action is a starter: calling it begins one unit of work. Returns the
/// successful outputs in completion order once every action has finished,
/// or the first failure as soon as it is observed. An empty sequence
/// succeeds immediately. A `limit` of 0 is treated as 1.
///
/// Must be called from within a Tokio runtime.
pub async fn queue_async_actions<I, F, Fut, T, E>(
    actions: I,
    limit: usize,
) -> Result<Vec<T>, QueueError<E>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let limit = limit.max(1);
    let mut pending = actions.into_iter();
    let mut running = FuturesUnordered::new();
    let mut outputs = Vec::new();

    for start in pending.by_ref().take(limit) {
        running.push(tokio::spawn(start()));
    }

    while let Some(joined) = running.next().await {
        // Returning drops the remaining JoinHandles, which detaches (does
        // not abort) their tasks.
        outputs.push(joined?.map_err(QueueError::Action)?);
        if let Some(start) = pending.next() {
            running.push(tokio::spawn(start()));
        }
    }

    Ok(outputs)
}
