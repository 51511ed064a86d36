// src/fetch/http.rs
// =============================================================================
// Fetches one archived snapshot body over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pooling) for every snapshot
// - Per-request timeout so a hung snapshot cannot block the final join
// - Every failure mode becomes a FetchOutcome with an error, never a panic
//
// The Fetcher trait is the seam between the scheduler and the network. The
// scheduler only ever sees `Arc<dyn Fetcher>`, which is what lets the tests
// drive it with in-memory fetchers.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Identifies us to the archive.
const USER_AGENT: &str = concat!("wayback-sweep/", env!("CARGO_PKG_VERSION"));

/// Why a single snapshot fetch failed. None of these abort the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("failed reading body: {0}")]
    Body(String),

    #[error("fetch task aborted: {0}")]
    Join(String),
}

/// The result of exactly one fetch attempt for one snapshot URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The snapshot URL that was requested
    pub source_url: String,
    /// The response body; always empty when `error` is set
    pub body: Vec<u8>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    pub fn success(source_url: String, body: Vec<u8>) -> Self {
        Self {
            source_url,
            body,
            error: None,
        }
    }

    pub fn failure(source_url: String, error: FetchError) -> Self {
        Self {
            source_url,
            body: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Anything that can turn a snapshot URL into a FetchOutcome.
///
/// Implementations must not panic on network failures; they report them
/// through `FetchOutcome::failure` instead.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Timeouts for snapshot fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the HTTP client used for both the index query and the snapshots.
///
/// Only the connect timeout lives on the client. The request timeout is
/// applied per snapshot by `ReqwestFetcher`, so a slow index query is never
/// cut short by it.
pub fn build_client(settings: &FetchSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(settings.connect_timeout)
        .build()
}

/// The real fetcher: a GET against the archive with a shared client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    request_timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(client: Client, settings: &FetchSettings) -> Self {
        Self {
            client,
            request_timeout: settings.request_timeout,
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let request = self.client.get(url).timeout(self.request_timeout);
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failure(url.to_string(), categorize_error(e, false)),
        };

        // The archive answers 429/503 when we go too fast; that body is not
        // the snapshot, so it must not reach dedup or output
        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::failure(url.to_string(), FetchError::Status(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::success(url.to_string(), body.to_vec()),
            Err(e) => FetchOutcome::failure(url.to_string(), categorize_error(e, true)),
        }
    }
}

// Maps a reqwest error onto our taxonomy. `reading_body` tells us whether the
// headers had already arrived when it happened.
fn categorize_error(error: reqwest::Error, reading_body: bool) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if reading_body {
        FetchError::Body(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}
