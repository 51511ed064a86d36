// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging on stderr
// 3. Validate the arguments into a SweepConfig
// 4. Run the sweep: index query, rate-limited fetches, dedup, output
// 5. Exit with proper code (0 = finished, 1 = fatal error)
//
// Failed snapshot fetches are NOT fatal. They are logged and the run goes
// on. Only a broken index query, bad configuration, or an output we cannot
// write stops the run.
// =============================================================================

mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config.rs - validated run configuration
mod dedup;    // src/dedup.rs - content hashing and first-writer-wins store
mod fetch;    // src/fetch/ - rate-limited concurrent snapshot fetching
mod index;    // src/index/ - CDX index query and parsing
mod logging;  // src/logging.rs - stderr logger
mod output;   // src/output/ - output modes, archive files, failure log
mod pipeline; // src/pipeline.rs - wires everything together
mod snapshot; // src/snapshot.rs - snapshot descriptors and URLs

use std::io::{self, BufWriter};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::Cli;
use config::SweepConfig;
use fetch::{build_client, ReqwestFetcher};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log_level());

    let config = SweepConfig::try_from(cli).context("invalid arguments")?;

    // One client for everything so the index query and the snapshots share
    // a connection pool
    let client = build_client(&config.fetch).context("failed to build HTTP client")?;
    let fetcher = Arc::new(ReqwestFetcher::new(client.clone(), &config.fetch));

    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());

    let summary = pipeline::run(&config, &client, fetcher, out)
        .await
        .with_context(|| format!("sweep of {} failed", config.query.url))?;

    info!(
        "Done: {} snapshot(s), {} dispatched, {} ok, {} failed, {} aborted, {} unique, {} duplicate(s), {} emitted, {} file(s) written",
        summary.snapshots,
        summary.dispatched,
        summary.succeeded,
        summary.failed,
        summary.aborted,
        summary.unique,
        summary.duplicates,
        summary.emitted,
        summary.files_written
    );

    Ok(())
}
