// src/pipeline.rs
// =============================================================================
// Wires the whole run together:
//
//   index query -> descriptors -> snapshot URLs -> scheduler -> aggregator
//
// The scheduler spawns one task per snapshot. Each task sends its outcome
// into an unbounded channel. The aggregator is the only receiver: it owns the
// dedup store and every output side effect, so dedup is one task doing one
// map lookup per outcome. Both halves run concurrently; the run is complete
// once the scheduler has joined every task and the aggregator has drained
// the channel.
//
// URL-list mode never reaches the scheduler.
// =============================================================================

use std::io::Write;
use std::sync::Arc;

use log::{debug, info, trace};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::SweepConfig;
use crate::fetch::{dispatch_all, DispatchReport, FetchOutcome, Fetcher, RateLimiter};
use crate::index::{fetch_snapshots, IndexError};
use crate::output::{FailureLog, OutputError, OutputMode, OutputRouter, RouterStats};
use crate::snapshot::snapshot_urls;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Counters for one run, logged at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub snapshots: usize,
    pub dispatched: usize,
    pub aborted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub emitted: usize,
    pub files_written: usize,
}

impl RunSummary {
    fn new(snapshots: usize, report: DispatchReport, stats: RouterStats) -> Self {
        Self {
            snapshots,
            dispatched: report.dispatched,
            aborted: report.aborted,
            succeeded: stats.succeeded,
            failed: stats.failed,
            unique: stats.unique,
            duplicates: stats.duplicates,
            emitted: stats.emitted,
            files_written: stats.files_written,
        }
    }
}

/// Runs one sweep.
///
/// `client` is used for the index query and `fetcher` for the snapshots, so
/// tests can swap either one. Payload goes to `out`.
pub async fn run<W: Write>(
    config: &SweepConfig,
    client: &Client,
    fetcher: Arc<dyn Fetcher>,
    out: W,
) -> Result<RunSummary, PipelineError> {
    let request_url = config.query.to_request_url(&config.index_base);
    let descriptors = fetch_snapshots(client, &request_url).await?;
    for descriptor in &descriptors {
        trace!(
            "Snapshot {} (index digest {}, length {})",
            descriptor.timestamp,
            descriptor.digest,
            descriptor.length
        );
    }

    let urls = snapshot_urls(&config.archive_base, &config.query.url, &descriptors);

    if config.estimate_time && config.mode != OutputMode::UrlList {
        eprintln!(
            "All {} requests will take at least {:?}",
            urls.len(),
            config.rate.estimate(urls.len())
        );
    }

    let failures = config
        .failure_log
        .as_deref()
        .map(FailureLog::open)
        .transpose()?;
    let mut router = OutputRouter::new(config.mode.clone(), out, failures)?;

    if config.mode == OutputMode::UrlList {
        router.emit_urls(&urls)?;
        let stats = router.finish()?;
        return Ok(RunSummary::new(urls.len(), DispatchReport::default(), stats));
    }

    info!(
        "Fetching {} snapshot(s), at most {} every {:?}",
        urls.len(),
        config.rate.max_requests(),
        config.rate.interval()
    );

    let snapshots = urls.len();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut limiter = RateLimiter::new(config.rate);

    let dispatch = async {
        let report = dispatch_all(fetcher, urls, &mut limiter, tx).await;
        Ok::<_, PipelineError>(report)
    };
    let (report, stats) = tokio::try_join!(dispatch, aggregate(rx, router))?;
    debug!("Limiter granted {} permit(s)", limiter.granted());

    Ok(RunSummary::new(snapshots, report, stats))
}

// Drains outcomes until every sender is gone, then finishes the output
async fn aggregate<W: Write>(
    mut rx: mpsc::UnboundedReceiver<FetchOutcome>,
    mut router: OutputRouter<W>,
) -> Result<RouterStats, PipelineError> {
    while let Some(outcome) = rx.recv().await {
        router.accept(outcome)?;
    }
    Ok(router.finish()?)
}
