//! Singer protocol messages

use crate::error::{Error, Result};
use crate::schema::CatalogEntry;
use crate::state::State;
use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};

/// A message written to the output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Describes the records of a stream before any of them is written
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of the records
        schema: JsonValue,
        /// Fields that uniquely identify a record
        key_properties: Vec<String>,
        /// Fields the bookmark is derived from
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One extracted record
    Record {
        /// Stream name
        stream: String,
        /// The formatted record
        record: Record,
    },
    /// Bookmarks to resume from
    State {
        /// Serialized [`State`]
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message from a catalog entry
    pub fn schema(entry: &CatalogEntry) -> Self {
        Self::Schema {
            stream: entry.stream.clone(),
            schema: entry.schema.clone(),
            key_properties: entry.key_properties.clone(),
            bookmark_properties: entry.replication_key.iter().cloned().collect(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    /// Create a state message
    pub fn state(state: &State) -> Result<Self> {
        let value = serde_json::to_value(state)
            .map_err(|e| Error::output(format!("Failed to serialize state: {e}")))?;
        Ok(Self::State { value })
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Serialize as a single JSON line (without the trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))
    }
}
