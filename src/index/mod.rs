// src/index/mod.rs
// =============================================================================
// This module talks to the Wayback CDX index.
//
// Submodules:
// - query: Builds the index query URL from the user's search parameters
// - client: Performs the query and parses the JSON table into descriptors
//
// The index is the only source of snapshot timestamps. If it fails, nothing
// else can run, so every error here is fatal for the whole run.
// =============================================================================

mod client;
mod query;

pub use client::{fetch_snapshots, IndexError};
pub use query::IndexQuery;
