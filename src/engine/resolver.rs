//! Customer batch resolver
//!
//! Customers cannot be listed. Their GUIDs are collected from bookings and
//! looked up in batches. A GUID is skipped once it has been emitted. A GUID
//! that a facility failed to return is not asked of that facility again,
//! but another facility may still resolve it.

use super::types::ResolveStats;
use crate::config::Facility;
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::RecordSink;
use crate::pagination::{NextPage, Page, PaginationState};
use crate::streams::{customer_guid, Customers, Formatted, TapStream};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Default number of GUIDs per lookup request
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Looks up customers referenced by other streams and emits them
#[derive(Debug)]
pub struct CustomerResolver {
    stream: Customers,
    batch_size: usize,
    resolved: HashSet<String>,
    /// (facility code, GUID) pairs the facility did not return
    failed: HashSet<(String, String)>,
    stats: ResolveStats,
}

impl Default for CustomerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl CustomerResolver {
    /// Create a resolver sending at most `batch_size` GUIDs per request
    pub fn new(batch_size: usize) -> Self {
        Self {
            stream: Customers::new(),
            batch_size: batch_size.max(1),
            resolved: HashSet::new(),
            failed: HashSet::new(),
            stats: ResolveStats::default(),
        }
    }

    /// GUIDs per lookup request
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether the customer `guid` was already emitted in this run
    pub fn is_resolved(&self, guid: &str) -> bool {
        self.resolved.contains(guid)
    }

    /// Whether `facility` already failed to return `guid` in this run
    pub fn has_failed(&self, facility: &Facility, guid: &str) -> bool {
        self.failed.contains(&(facility.code.clone(), guid.to_string()))
    }

    /// Totals over every batch resolved so far
    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Look up `guids` for `facility` and emit the customers to `sink`.
    ///
    /// Lookup failures are logged and counted as unresolved. Only sink
    /// failures are returned.
    pub async fn resolve<'a>(
        &mut self,
        client: &HttpClient,
        base: &Url,
        facility: &Facility,
        guids: impl IntoIterator<Item = &'a str>,
        sink: &mut dyn RecordSink,
    ) -> Result<ResolveStats> {
        let mut seen = HashSet::new();
        let pending: Vec<String> = guids
            .into_iter()
            .filter(|guid| {
                !guid.is_empty()
                    && !self.is_resolved(guid)
                    && !self.has_failed(facility, guid)
                    && seen.insert(*guid)
            })
            .map(ToString::to_string)
            .collect();

        let mut stats = ResolveStats {
            requested: pending.len(),
            ..ResolveStats::default()
        };

        for chunk in pending.chunks(self.batch_size) {
            let found = self
                .lookup(client, base, facility, chunk, sink, &mut stats)
                .await?;
            stats.resolved += found.len();

            let missing: Vec<&str> = chunk
                .iter()
                .map(String::as_str)
                .filter(|guid| !found.contains(*guid))
                .collect();
            if !missing.is_empty() {
                warn!(
                    "Could not resolve {} customer(s) for facility {}: {}",
                    missing.len(),
                    facility.code,
                    missing.join(",")
                );
                stats.unresolved += missing.len();
                self.failed.extend(
                    missing
                        .iter()
                        .map(|guid| (facility.code.clone(), (*guid).to_string())),
                );
            }
            self.resolved.extend(found);
        }

        self.stats.merge(&stats);
        Ok(stats)
    }

    /// Walk the pages of one chunk's lookup and emit its customers.
    /// Returns the GUIDs emitted.
    async fn lookup(
        &self,
        client: &HttpClient,
        base: &Url,
        facility: &Facility,
        chunk: &[String],
        sink: &mut dyn RecordSink,
        stats: &mut ResolveStats,
    ) -> Result<HashSet<String>> {
        let mut found = HashSet::new();
        let mut state = PaginationState::new();

        while !state.done && found.len() < chunk.len() {
            let url = match self.stream.lookup_url(base, facility, chunk, state.page) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Failed to build customer lookup URL: {e}");
                    break;
                }
            };

            stats.requests += 1;
            let page = match client
                .fetch_json(&url)
                .await
                .and_then(|body| Page::from_body(state.page, &body, self.stream.records_key()))
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Customer lookup failed for facility {} on page {}: {e}",
                        facility.code, state.page
                    );
                    break;
                }
            };

            let next = state.advance(&page);
            for raw in page.records {
                let record = match self.stream.format_record(raw, facility) {
                    Ok(Formatted::Record(record)) => record,
                    Ok(Formatted::Dropped(reason)) => {
                        debug!("Dropping customer record: {reason}");
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping customer record for facility {}: {e}", facility.code);
                        continue;
                    }
                };

                let Some(guid) = customer_guid(&record) else {
                    continue;
                };
                if !chunk.iter().any(|g| g == guid) || found.contains(guid) {
                    debug!("Ignoring customer {guid} not in the requested batch");
                    continue;
                }

                found.insert(guid.to_string());
                sink.emit(self.stream.name(), &record)?;
            }

            if let NextPage::Continue(n) = next {
                debug!("Customer lookup for facility {} continues on page {n}", facility.code);
            }
        }

        Ok(found)
    }
}
