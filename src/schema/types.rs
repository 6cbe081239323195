//! Catalog types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Replication method advertised for incremental streams
pub const INCREMENTAL: &str = "INCREMENTAL";

/// Streams the tap can extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per stream, in processing order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Get an entry by stream name
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|entry| entry.stream == stream)
    }

    /// Stream names in processing order
    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.iter().map(|entry| entry.stream.as_str()).collect()
    }
}

/// Catalog entry for a single stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream name
    pub stream: String,

    /// Stream identifier (same as the name)
    pub tap_stream_id: String,

    /// JSON schema of emitted records
    pub schema: Value,

    /// Fields that uniquely identify a record
    pub key_properties: Vec<String>,

    /// Field the bookmark follows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Replication method
    pub replication_method: String,
}

impl CatalogEntry {
    /// Names of the top-level properties declared by the schema
    pub fn property_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
