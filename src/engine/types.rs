//! Engine types
//!
//! Counters reported by the page walk and the customer resolver.

use crate::types::Timestamp;

/// Outcome of resolving one batch of customer GUIDs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// GUIDs sent to the API (after deduplication)
    pub requested: usize,
    /// Customers emitted
    pub resolved: usize,
    /// GUIDs that could not be resolved
    pub unresolved: usize,
    /// Lookup requests made
    pub requests: usize,
}

impl ResolveStats {
    /// Add another batch's counters
    pub fn merge(&mut self, other: &ResolveStats) {
        self.requested += other.requested;
        self.resolved += other.resolved;
        self.unresolved += other.unresolved;
        self.requests += other.requests;
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    /// Records written to the sink
    pub records_emitted: usize,
    /// Records at or before the stored bookmark
    pub records_skipped: usize,
    /// Records dropped by the stream formatter or without an updated time
    pub records_dropped: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Page walks completed
    pub streams_synced: usize,
    /// Customer lookups
    pub customers: ResolveStats,
    /// Highest updated time committed by the walk, if the bookmark moved
    pub bookmark: Option<Timestamp>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an emitted record
    pub fn add_emitted(&mut self) {
        self.records_emitted += 1;
    }

    /// Count a record filtered by the bookmark
    pub fn add_skipped(&mut self) {
        self.records_skipped += 1;
    }

    /// Count a dropped record
    pub fn add_dropped(&mut self) {
        self.records_dropped += 1;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Add the counters of a finished walk
    pub fn merge(&mut self, other: &SyncStats) {
        self.records_emitted += other.records_emitted;
        self.records_skipped += other.records_skipped;
        self.records_dropped += other.records_dropped;
        self.pages_fetched += other.pages_fetched;
        self.streams_synced += other.streams_synced;
        self.customers.merge(&other.customers);
        self.duration_ms += other.duration_ms;
        self.bookmark = self.bookmark.max(other.bookmark);
    }
}
