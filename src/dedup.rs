// src/dedup.rs
// =============================================================================
// Content deduplication for fetched snapshot bodies.
//
// Many snapshots of a URL store byte-identical responses. We hash each body
// with SHA-1 and keep only the first outcome seen for every hash. Later
// outcomes with the same hash are dropped without comparing bytes.
//
// We hash what we fetched rather than trusting the digest column of the
// index: the index digest describes the archived record, and the archive can
// serve something else (a rate-limit page, a rewritten body).
//
// The store is owned by exactly one task (the pipeline aggregator), and the
// membership test plus insert is a single HashMap entry lookup. Concurrent
// fetches never touch it directly.
// =============================================================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use sha1::{Digest, Sha1};

use crate::fetch::FetchOutcome;

/// 160-bit SHA-1 digest of a response body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 20]);

impl ContentHash {
    pub fn of(body: &[u8]) -> Self {
        let digest = Sha1::digest(body);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Lowercase hex, 40 characters. Used as the archive filename.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// What happened to an outcome offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First body with this hash; it is now in the store
    Inserted(ContentHash),
    /// Another outcome already holds this hash
    Duplicate(ContentHash),
    /// Errored or empty outcome, not eligible for dedup
    Skipped,
}

/// First-writer-wins map from content hash to fetch outcome.
#[derive(Debug, Default)]
pub struct DedupStore {
    entries: HashMap<ContentHash, FetchOutcome>,
    // insertion order, so iteration is deterministic for a given completion order
    order: Vec<ContentHash>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an outcome to the store. Check and insert happen in one step.
    pub fn admit(&mut self, outcome: FetchOutcome) -> Admission {
        if !outcome.is_ok() || outcome.body.is_empty() {
            return Admission::Skipped;
        }

        let hash = ContentHash::of(&outcome.body);
        match self.entries.entry(hash) {
            Entry::Vacant(slot) => {
                slot.insert(outcome);
                self.order.push(hash);
                Admission::Inserted(hash)
            }
            Entry::Occupied(_) => Admission::Duplicate(hash),
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&FetchOutcome> {
        self.entries.get(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in the order they were first inserted.
    pub fn iter(&self) -> impl Iterator<Item = (&ContentHash, &FetchOutcome)> {
        self.order
            .iter()
            .filter_map(move |hash| self.entries.get(hash).map(|outcome| (hash, outcome)))
    }
}
