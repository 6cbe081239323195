//! Common types used throughout tap-rockgympro
//!
//! This module contains shared type aliases used across multiple modules.

use chrono::{DateTime, Utc};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record as returned by the API and emitted to the sink
pub type Record = JsonObject;

/// An absolute point in time, as stored in bookmarks
pub type Timestamp = DateTime<Utc>;
