//! Execution engine module
//!
//! Page walk and customer resolution.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Walks one stream of one facility page by page, filters
//!   records against the stored bookmark and commits the new bookmark
//! - `CustomerResolver` - Looks up customers referenced by bookings
//! - `SyncStats` - Counters for a walk or a whole run

mod resolver;
mod types;

pub use resolver::{CustomerResolver, DEFAULT_BATCH_SIZE};
pub use types::{ResolveStats, SyncStats};

use crate::config::Facility;
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::RecordSink;
use crate::pagination::{Page, PaginationState};
use crate::state::BookmarkStore;
use crate::streams::{Formatted, TapStream};
use crate::types::{Record, Timestamp};
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<S: BookmarkStore> {
    /// HTTP client
    client: HttpClient,
    /// API root
    base_url: Url,
    /// Bookmark storage
    store: S,
    /// Statistics
    stats: SyncStats,
}

impl<S: BookmarkStore> SyncEngine<S> {
    /// Create a new sync engine
    pub fn new(client: HttpClient, base_url: Url, store: S) -> Self {
        Self {
            client,
            base_url,
            store,
            stats: SyncStats::default(),
        }
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Get the API root
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the bookmark store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get statistics accumulated over every walk
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Walk every page of `stream` for `facility` and emit new records.
    ///
    /// Records whose updated time is not after the stored bookmark are
    /// skipped. With a resolver attached, the customers referenced by each
    /// page are emitted before the page's records. The bookmark is committed
    /// once, after the last page, and only if it moved forward. Any error
    /// aborts the walk without touching the bookmark.
    pub async fn sync_stream(
        &mut self,
        stream: &dyn TapStream,
        facility: &Facility,
        sink: &mut dyn RecordSink,
        mut resolver: Option<&mut CustomerResolver>,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let name = stream.name();
        let stored = self.store.get(name, &facility.code).await;
        let mut max_seen = stored;
        let mut walk = SyncStats::new();
        let mut pagination = PaginationState::new();

        info!(
            "Starting sync for stream {name}, facility {} (bookmark: {})",
            facility.code,
            stored.map_or_else(|| "none".to_string(), |ts| ts.to_rfc3339())
        );

        loop {
            let number = pagination.page;
            let url = stream.build_url(&self.base_url, facility, number, stored.as_ref())?;
            let body = self.client.fetch_json(&url).await?;
            let page = Page::from_body(number, &body, stream.records_key())?;
            walk.add_page();
            let next = pagination.advance(&page);

            debug!(
                "Page {number} of {name}/{}: {} records",
                facility.code,
                page.records.len()
            );

            let kept = self.filter_page(stream, facility, page, stored, &mut walk)?;

            if let Some(resolver) = resolver.as_deref_mut() {
                let guids = kept.iter().filter_map(|(_, record)| stream.customer_guid(record));
                let resolved = resolver
                    .resolve(&self.client, &self.base_url, facility, guids, sink)
                    .await?;
                walk.customers.merge(&resolved);
            }

            for (updated, record) in &kept {
                sink.emit(name, record)?;
                walk.add_emitted();
                max_seen = max_seen.max(Some(*updated));
            }

            if next.is_done() {
                break;
            }
        }

        if let Some(bookmark) = max_seen.filter(|ts| Some(*ts) > stored) {
            self.store.set(name, &facility.code, bookmark).await?;
            walk.bookmark = Some(bookmark);
        }

        walk.add_stream();
        walk.set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));

        info!(
            "Completed sync for {name}/{}: {} emitted, {} skipped, {} dropped in {} pages",
            facility.code,
            walk.records_emitted,
            walk.records_skipped,
            walk.records_dropped,
            walk.pages_fetched
        );

        self.stats.merge(&walk);
        Ok(walk)
    }

    /// Apply the bookmark filter and the stream formatter to one page
    fn filter_page(
        &self,
        stream: &dyn TapStream,
        facility: &Facility,
        page: Page,
        stored: Option<Timestamp>,
        walk: &mut SyncStats,
    ) -> Result<Vec<(Timestamp, Record)>> {
        let mut kept = Vec::with_capacity(page.records.len());

        for raw in page.records {
            let Some(updated) = stream.updated_time(&raw, facility)? else {
                debug!("Dropping {} record without an updated time", stream.name());
                walk.add_dropped();
                continue;
            };

            if stored.is_some_and(|bookmark| updated <= bookmark) {
                walk.add_skipped();
                continue;
            }

            match stream.format_record(raw, facility)? {
                Formatted::Record(record) => kept.push((updated, record)),
                Formatted::Dropped(reason) => {
                    debug!("Dropping {} record: {reason}", stream.name());
                    walk.add_dropped();
                }
            }
        }

        Ok(kept)
    }
}

impl<S: BookmarkStore + std::fmt::Debug> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client", &self.client)
            .field("base_url", &self.base_url.as_str())
            .field("store", &self.store)
            .field("stats", &self.stats)
            .finish()
    }
}
