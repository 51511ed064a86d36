// src/fetch/scheduler.rs
// =============================================================================
// Spawns one fetch task per snapshot URL, throttled by the RateLimiter.
//
// How it works:
// 1. Ask the limiter for a permit (this is where batch pauses happen)
// 2. Spawn a tokio task that fetches the URL and sends its FetchOutcome
//    down the channel
// 3. Repeat for every URL, in snapshot order
// 4. Join every spawned task before returning
//
// Nothing here bounds how many fetches are in flight at once. The limiter
// bounds how fast they START; a window's worth of fetches can still be
// running when the next window opens.
//
// Outcomes are delivered in completion order. The receiving side is the
// single aggregator that owns the dedup store (see pipeline.rs).
// =============================================================================

use std::sync::Arc;

use futures::future::join_all;
use log::{trace, warn};
use tokio::sync::mpsc::UnboundedSender;

use super::http::{FetchError, FetchOutcome, Fetcher};
use super::limiter::RateLimiter;

/// What the scheduler did, for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tasks spawned (always equal to the number of URLs)
    pub dispatched: usize,
    /// Tasks that panicked or were cancelled before reporting
    pub aborted: usize,
}

/// Fetches every URL under the limiter and streams outcomes into `outcomes`.
///
/// Exactly one outcome is sent per URL, even for tasks that panic. The sender
/// is dropped when this returns, so a receiver loop ends once it has drained
/// everything.
pub async fn dispatch_all(
    fetcher: Arc<dyn Fetcher>,
    urls: Vec<String>,
    limiter: &mut RateLimiter,
    outcomes: UnboundedSender<FetchOutcome>,
) -> DispatchReport {
    let mut handles = Vec::with_capacity(urls.len());
    let mut in_flight_urls = Vec::with_capacity(urls.len());

    for url in urls {
        let position = limiter.acquire().await;
        trace!("Dispatching #{}: {}", position, url);

        let fetcher = Arc::clone(&fetcher);
        let tx = outcomes.clone();
        let task_url = url.clone();
        handles.push(tokio::spawn(async move {
            let outcome = fetcher.fetch(&task_url).await;
            // Only fails if the aggregator is gone, and then nobody wants it
            let _ = tx.send(outcome);
        }));
        in_flight_urls.push(url);
    }

    let mut report = DispatchReport {
        dispatched: handles.len(),
        aborted: 0,
    };

    for (url, joined) in in_flight_urls.into_iter().zip(join_all(handles).await) {
        if let Err(e) = joined {
            warn!("Fetch task for {} did not finish: {}", url, e);
            report.aborted += 1;
            let _ = outcomes.send(FetchOutcome::failure(url, FetchError::Join(e.to_string())));
        }
    }

    report
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why tokio::spawn instead of buffer_unordered?
//    - buffer_unordered(N) caps how many futures run at once
//    - We want the opposite: start them at a fixed pace and let them overlap
//    - A spawned task starts running immediately and independently
//
// 2. Why Arc<dyn Fetcher>?
//    - Every spawned task needs its own handle to the fetcher ('static)
//    - Arc clones are just a reference count bump
//    - dyn Fetcher lets tests plug in a fake without touching the network
//
// 3. What does join_all give us?
//    - A Vec of JoinHandle results, in the order the tasks were spawned
//    - Err(JoinError) means the task panicked or was cancelled
//
// 4. Why is the sender cloned per task?
//    - The channel closes when the LAST sender is dropped
//    - The receiver's loop ends exactly when every task is done
// -----------------------------------------------------------------------------
