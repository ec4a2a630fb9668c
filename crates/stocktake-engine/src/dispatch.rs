//! Bounded-concurrency fan-out of per-item detail fetches.
//!
//! Tasks are consumed through `buffer_unordered`, so at most `limit`
//! requests are in flight at any instant. Every submitted task yields
//! exactly one [`TaskOutcome`] — failed fetches become explicit `Failed`
//! entries rather than silent omissions, so the caller can count losses.

use std::future::Future;

use futures::stream::{self, StreamExt};

use stocktake_api::ApiError;

/// Result slot for one dispatched fetch task.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Fetched(T),
    Failed { href: String, error: ApiError },
}

/// Executes `fetch` for every href with at most `limit` tasks in flight.
///
/// Outcomes are returned in completion order, which is unconstrained —
/// callers must not rely on it.
///
/// # Errors
///
/// A fatal error from any task ([`ApiError::is_fatal`]) short-circuits the
/// whole dispatch: tasks not yet started are never issued, in-flight tasks
/// are dropped (best-effort cancellation), and the fatal error is returned.
/// Non-fatal task errors never abort the dispatch.
pub async fn dispatch_all<T, F, Fut>(
    hrefs: Vec<String>,
    limit: usize,
    fetch: F,
) -> Result<Vec<TaskOutcome<T>>, ApiError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let total = hrefs.len();
    let mut outcomes = Vec::with_capacity(total);

    let mut in_flight = stream::iter(hrefs.into_iter().map(|href| {
        let task = fetch(href.clone());
        async move { (href, task.await) }
    }))
    .buffer_unordered(limit.max(1));

    while let Some((href, result)) = in_flight.next().await {
        match result {
            Ok(value) => outcomes.push(TaskOutcome::Fetched(value)),
            Err(error) if error.is_fatal() => {
                tracing::error!(
                    %href,
                    completed = outcomes.len(),
                    total,
                    error = %error,
                    "fatal error — cancelling remaining detail fetches"
                );
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(%href, error = %error, "detail fetch failed — skipping item");
                outcomes.push(TaskOutcome::Failed { href, error });
            }
        }
    }

    Ok(outcomes)
}
