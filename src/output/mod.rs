// src/output/mod.rs
// =============================================================================
// This module decides what happens to every fetch outcome.
//
// Submodules:
// - archive: Content-addressed files for archive mode
// - failures: Optional JSON-lines log of failed fetches
//
// Modes (exactly one per run):
// - Raw:     every successful body, in completion order
// - UrlList: the snapshot URLs, in snapshot order, with no fetching at all
// - Unique:  each body the first time its content hash is seen
// - Archive: every unique body as a file named by its hash, after the run
//
// The router owns the DedupStore and every output side effect. It runs
// inside the single aggregator task, so nothing here needs a lock.
// =============================================================================

mod archive;
mod failures;

use std::io::{self, Write};
use std::path::PathBuf;

use log::{debug, info, warn};
use thiserror::Error;

use crate::dedup::{Admission, DedupStore};
use crate::fetch::FetchOutcome;

pub use archive::ArchiveWriter;
pub use failures::FailureLog;

/// Where the results of a run go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Raw,
    UrlList,
    Unique,
    Archive(PathBuf),
}

/// Output failures. These are fatal for the run.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed writing to output: {0}")]
    Write(#[source] io::Error),

    #[error("output directory {} is unusable: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing archive file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing failure log {}: {source}", .path.display())]
    FailureLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counters collected while routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub succeeded: usize,
    pub failed: usize,
    pub unique: usize,
    pub duplicates: usize,
    /// Bodies or URLs written to the output stream
    pub emitted: usize,
    pub files_written: usize,
}

/// Routes outcomes to the configured output.
pub struct OutputRouter<W: Write> {
    mode: OutputMode,
    out: W,
    store: DedupStore,
    archive: Option<ArchiveWriter>,
    failures: Option<FailureLog>,
    stats: RouterStats,
}

impl<W: Write> OutputRouter<W> {
    /// Creates a router. In archive mode the target directory is created now,
    /// so an unusable directory fails the run before any fetching starts.
    pub fn new(mode: OutputMode, out: W, failures: Option<FailureLog>) -> Result<Self, OutputError> {
        let archive = match &mode {
            OutputMode::Archive(dir) => Some(ArchiveWriter::create(dir.clone())?),
            _ => None,
        };

        Ok(Self {
            mode,
            out,
            store: DedupStore::new(),
            archive,
            failures,
            stats: RouterStats::default(),
        })
    }

    /// URL-list mode: writes every snapshot URL, one per line, in order.
    pub fn emit_urls(&mut self, urls: &[String]) -> Result<(), OutputError> {
        for url in urls {
            self.write_line(url.as_bytes())?;
        }
        Ok(())
    }

    /// Handles one fetch outcome as soon as it arrives.
    pub fn accept(&mut self, outcome: FetchOutcome) -> Result<(), OutputError> {
        if let Some(error) = &outcome.error {
            warn!("Failed to fetch {}: {}", outcome.source_url, error);
            self.stats.failed += 1;
            if let Some(log) = self.failures.as_mut() {
                log.record(&outcome)?;
            }
            return Ok(());
        }
        self.stats.succeeded += 1;

        if self.mode == OutputMode::Raw {
            return self.write_line(&outcome.body);
        }

        let source_url = outcome.source_url.clone();
        match self.store.admit(outcome) {
            Admission::Inserted(hash) => {
                self.stats.unique += 1;
                debug!("New content {} from {}", hash, source_url);
                if self.mode == OutputMode::Unique {
                    let body = self
                        .store
                        .get(&hash)
                        .map(|entry| entry.body.clone())
                        .unwrap_or_default();
                    self.write_line(&body)?;
                }
            }
            Admission::Duplicate(hash) => {
                self.stats.duplicates += 1;
                debug!("Duplicate content {} from {}", hash, source_url);
            }
            Admission::Skipped => debug!("Empty body from {}", source_url),
        }
        Ok(())
    }

    /// Writes the archive (if any), flushes everything and returns the counters.
    pub fn finish(mut self) -> Result<RouterStats, OutputError> {
        if let Some(archive) = &self.archive {
            debug!("Archiving {} unique bod(ies)", self.store.len());
            for (hash, outcome) in self.store.iter() {
                archive.write(hash, &outcome.body)?;
                self.stats.files_written += 1;
            }
        }

        self.out.flush().map_err(OutputError::Write)?;
        if let Some(log) = self.failures.as_mut() {
            log.flush()?;
            if log.recorded() > 0 {
                info!("Recorded {} failed fetch(es) in {}", log.recorded(), log.path().display());
            }
        }
        Ok(self.stats)
    }

    // Body (or URL) followed by a newline, as one emitted item
    fn write_line(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
        self.out.write_all(bytes).map_err(OutputError::Write)?;
        self.out.write_all(b"\n").map_err(OutputError::Write)?;
        self.stats.emitted += 1;
        Ok(())
    }
}
