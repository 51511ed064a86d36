// src/fetch/mod.rs
// =============================================================================
// This module contains the rate-limited concurrent fetch machinery.
//
// Submodules:
// - http: The Fetcher trait, FetchOutcome, and the reqwest-backed fetcher
// - limiter: RatePolicy and the windowed RateLimiter
// - scheduler: Spawns one task per snapshot URL under the limiter
// =============================================================================

mod http;
mod limiter;
mod scheduler;

pub use http::{build_client, FetchError, FetchOutcome, FetchSettings, Fetcher, ReqwestFetcher};
pub use limiter::{RateLimiter, RatePolicy, DEFAULT_INTERVAL, DEFAULT_MAX_REQUESTS};
pub use scheduler::{dispatch_all, DispatchReport};
