//! Fan-out/fan-in joins over independently completing operations.
//!
//! Every discovery step of a layout cycle dispatches N host queries at once and
//! continues only when all of them have reported. The joins here provide that
//! barrier with these guarantees:
//!
//! - The join resolves exactly once, after every operation has completed, in any
//!   completion order. Completion accounting is done by the future combinators, so
//!   there is no shared counter to race on.
//! - An operation that fails (returns `None`) is omitted from the result and never
//!   aborts the join.
//! - Results come back in descriptor order, not completion order.
//! - An empty input resolves immediately with an empty result.
//!
//! Two flavours exist: [`join_all`] polls every operation inside the calling task
//! (cooperative model, no `'static` bound), and [`join_all_spawned`] runs each
//! operation as its own tokio task (multi-threaded model).

use std::future::Future;

use futures::future::{self, BoxFuture};
use tokio::task::JoinSet;

/// Runs `exec` for every descriptor concurrently and collects the successful results.
///
/// Results are returned in descriptor order. Operations resolving to `None` are
/// skipped.
pub async fn join_all<D, T, F, Fut>(descriptors: impl IntoIterator<Item = D>, exec: F) -> Vec<T>
where
    F: FnMut(D) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let pending: Vec<Fut> = descriptors.into_iter().map(exec).collect();
    if pending.is_empty() {
        return Vec::new();
    }

    future::join_all(pending).await.into_iter().flatten().collect()
}

/// Like [`join_all`], for operations that report errors instead of `None`.
///
/// Errors are logged at `debug` level with the given `context` and omitted.
pub async fn join_ok<D, T, E, F, Fut>(
    context: &'static str,
    descriptors: impl IntoIterator<Item = D>,
    exec: F,
) -> Vec<T>
where
    F: FnMut(D) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let pending: Vec<Fut> = descriptors.into_iter().map(exec).collect();
    if pending.is_empty() {
        return Vec::new();
    }

    future::join_all(pending)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(context, error = %err, "excluding failed operation from join");
                None
            }
        })
        .collect()
}

/// Runs a set of boolean checks concurrently and returns their conjunction.
///
/// All checks always run to completion, even after one of them returned `false`.
/// An empty set of checks is vacuously true.
pub async fn join_all_true(checks: Vec<BoxFuture<'_, bool>>) -> bool {
    future::join_all(checks).await.into_iter().all(|passed| passed)
}

/// Runs `exec` for every descriptor as a separate tokio task and collects the
/// successful results in descriptor order.
///
/// A task that panics or is cancelled counts as an omitted result.
pub async fn join_all_spawned<D, T, F, Fut>(
    descriptors: impl IntoIterator<Item = D>,
    mut exec: F,
) -> Vec<T>
where
    F: FnMut(D) -> Fut,
    Fut: Future<Output = Option<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut tasks = JoinSet::new();
    let mut count = 0;

    for (index, descriptor) in descriptors.into_iter().enumerate() {
        let operation = exec(descriptor);
        tasks.spawn(async move { (index, operation.await) });
        count += 1;
    }

    if count == 0 {
        return Vec::new();
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(count).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = value,
            Err(err) => tracing::debug!(error = %err, "spawned join operation did not complete"),
        }
    }

    slots.into_iter().flatten().collect()
}

// ============================================================================
// Tests
// ============================================================================
