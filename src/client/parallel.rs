//! Bounded fan-out for per-item upstream requests.
//!
//! Keeps at most `workers` requests in flight, starting the next queued item
//! as soon as one finishes.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

/// Worker pool size for `queue` items: `percent` of the queue, rounded, but
/// never below 1 nor above `max`.
pub fn pool_size(max: usize, queue: usize, percent: f64) -> usize {
    let size = (queue as f64 * percent).round() as usize;
    size.clamp(1, max.max(1))
}

/// Run `task` over every item with at most `workers` running concurrently.
///
/// Results are returned in completion order.
///
/// # Example
///
/// ```ignore
/// let grants = run_bounded(image_ids, |id| async move { lookup(id).await }, 4).await;
/// ```
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, task: F, workers: usize) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = workers.max(1);
    debug!("Running {} tasks with {} workers", items.len(), workers);

    let mut results = Vec::with_capacity(items.len());
    let mut in_flight = FuturesUnordered::new();
    let mut queue = items.into_iter();

    for item in queue.by_ref().take(workers) {
        in_flight.push(task(item));
    }

    while let Some(result) = in_flight.next().await {
        results.push(result);

        if let Some(next) = queue.next() {
            in_flight.push(task(next));
        }
    }

    results
}
