//! Schema discovery
//!
//! JSON schemas for every stream are bundled with the binary. Discovery pairs
//! each schema with the stream's key properties and replication key and
//! returns them in processing order.

mod types;

pub use types::{Catalog, CatalogEntry, INCREMENTAL};

use crate::error::{Error, Result};
use crate::streams::StreamKind;
use chrono::NaiveDateTime;
use serde_json::Value;

const CUSTOMERS_SCHEMA: &str = include_str!("../../schemas/customers.json");
const BOOKINGS_SCHEMA: &str = include_str!("../../schemas/bookings.json");
const INVOICES_SCHEMA: &str = include_str!("../../schemas/invoices.json");

/// Raw bundled schema of a stream
pub fn raw_schema(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Customers => CUSTOMERS_SCHEMA,
        StreamKind::Bookings => BOOKINGS_SCHEMA,
        StreamKind::Invoices => INVOICES_SCHEMA,
    }
}

/// Parsed schema of a stream
pub fn load_schema(kind: StreamKind) -> Result<Value> {
    serde_json::from_str(raw_schema(kind)).map_err(|e| Error::Schema {
        stream: kind.name().to_string(),
        message: e.to_string(),
    })
}

/// Catalog entry of a single stream
pub fn catalog_entry(kind: StreamKind) -> Result<CatalogEntry> {
    // start date only affects request URLs
    let stream = kind.stream(NaiveDateTime::default());
    Ok(CatalogEntry {
        stream: kind.name().to_string(),
        tap_stream_id: kind.name().to_string(),
        schema: load_schema(kind)?,
        key_properties: stream
            .key_properties()
            .iter()
            .map(ToString::to_string)
            .collect(),
        replication_key: Some(stream.updated_field().to_string()),
        replication_method: INCREMENTAL.to_string(),
    })
}

/// Catalog of all streams in processing order
pub fn discover() -> Result<Catalog> {
    discover_streams(&StreamKind::ORDERED)
}

/// Catalog restricted to `kinds`, in the order given
pub fn discover_streams(kinds: &[StreamKind]) -> Result<Catalog> {
    let streams = kinds
        .iter()
        .map(|kind| catalog_entry(*kind))
        .collect::<Result<Vec<_>>>()?;
    Ok(Catalog { streams })
}
