// src/snapshot.rs
// =============================================================================
// Snapshot descriptors and the URL builder that turns them into fetchable
// Wayback Machine addresses.
//
// A descriptor is one row of the CDX index: when the capture happened, the
// digest the archive computed, and the stored length. We never reformat the
// timestamp - it goes into the URL exactly as the index returned it.
//
// URL shape:
//   <archive-base>/web/<timestamp>if_/<original url pattern>
//
// The "if_" flag asks the archive for the raw stored response without the
// Wayback toolbar injected into it.
// =============================================================================

/// One historical capture of a URL, as listed by the CDX index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDescriptor {
    /// 14-digit capture time (yyyyMMddHHmmss)
    pub timestamp: String,
    /// Content digest reported by the index (not used for dedup)
    pub digest: String,
    /// Stored response length reported by the index
    pub length: String,
}

/// Builds the fetchable snapshot URL for one descriptor.
///
/// A trailing slash on `archive_base` is tolerated so both
/// "https://web.archive.org" and "https://web.archive.org/" work.
pub fn snapshot_url(archive_base: &str, original_url: &str, descriptor: &SnapshotDescriptor) -> String {
    format!(
        "{}/web/{}if_/{}",
        archive_base.trim_end_matches('/'),
        descriptor.timestamp,
        original_url
    )
}

/// Builds the snapshot URL for every descriptor, keeping index order.
pub fn snapshot_urls(
    archive_base: &str,
    original_url: &str,
    descriptors: &[SnapshotDescriptor],
) -> Vec<String> {
    descriptors
        .iter()
        .map(|descriptor| snapshot_url(archive_base, original_url, descriptor))
        .collect()
}
