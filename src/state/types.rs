//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! { "bookmarks": { "bookings": { "ABC": "2025-03-05T09:00:00Z" } } }
//! ```

use crate::error::Result;
use crate::types::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage for per-(stream, facility) bookmarks
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Latest committed bookmark
    async fn get(&self, stream: &str, facility: &str) -> Option<Timestamp>;

    /// Commit a bookmark. Values not newer than the stored one are ignored.
    async fn set(&self, stream: &str, facility: &str, value: Timestamp) -> Result<()>;
}

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: HashMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Bookmark for a facility within a stream
    pub fn get_bookmark(&self, stream: &str, facility: &str) -> Option<Timestamp> {
        self.bookmarks.get(stream)?.get(facility)
    }

    /// Move a bookmark forward.
    ///
    /// Returns `false` and leaves the state untouched when `value` is not
    /// newer than the stored bookmark.
    pub fn advance_bookmark(&mut self, stream: &str, facility: &str, value: Timestamp) -> bool {
        self.get_stream_mut(stream).advance(facility, value)
    }
}

/// Bookmarks of a single stream, keyed by facility code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamState {
    facilities: HashMap<String, Timestamp>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Bookmark for a facility
    pub fn get(&self, facility: &str) -> Option<Timestamp> {
        self.facilities.get(facility).copied()
    }

    /// Move a facility's bookmark forward; see [`State::advance_bookmark`]
    pub fn advance(&mut self, facility: &str, value: Timestamp) -> bool {
        match self.facilities.get(facility) {
            Some(current) if *current >= value => false,
            _ => {
                self.facilities.insert(facility.to_string(), value);
                true
            }
        }
    }

    /// Facilities with a bookmark
    pub fn facilities(&self) -> impl Iterator<Item = &str> {
        self.facilities.keys().map(String::as_str)
    }
}
