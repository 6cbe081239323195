//! Stream definitions
//!
//! Every entity type the tap extracts implements [`TapStream`]. A stream knows
//! how to address one facility's collection, how to derive the created and
//! updated instants of a raw record, and how to turn a raw record into the
//! record that is emitted (or drop it).
//!
//! # Streams
//!
//! | Stream | Updated time | Start filter |
//! |---|---|---|
//! | `customers` | `lastRecordEdit` | none, resolved from bookings |
//! | `bookings` | later of `bookingDate` and `cancelledOn` | none |
//! | `invoices` | `invoicePostDate` (facility-local) | `startDateTime` |

mod bookings;
mod customers;
mod invoices;

pub use bookings::Bookings;
pub use customers::Customers;
pub use invoices::Invoices;

use crate::config::Facility;
use crate::error::{Error, Result};
use crate::record::FieldPath;
use crate::timestamp::{self, normalize_value};
use crate::types::{JsonValue, Record, Timestamp};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Field injected into every emitted record
pub const FACILITY_CODE_FIELD: &str = "facilityCode";

/// Cross-reference to the customer a record belongs to
pub const CUSTOMER_GUID_FIELD: &str = "customerGuid";

// ============================================================================
// Stream Kind
// ============================================================================

/// The entity types extracted by the tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    /// Customers referenced by bookings
    Customers,
    /// Class and event bookings
    Bookings,
    /// Invoices and their payments
    Invoices,
}

impl StreamKind {
    /// All streams in processing order.
    ///
    /// Customers come first: they are resolved while bookings are walked and
    /// must reach the sink before the bookings that reference them.
    pub const ORDERED: [StreamKind; 3] = [Self::Customers, Self::Bookings, Self::Invoices];

    /// Stream name as used in catalogs, state and output
    pub fn name(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Bookings => "bookings",
            Self::Invoices => "invoices",
        }
    }

    /// Build the stream implementation
    pub fn stream(self, start_date: NaiveDateTime) -> Box<dyn TapStream> {
        match self {
            Self::Customers => Box::new(Customers::new()),
            Self::Bookings => Box::new(Bookings::new()),
            Self::Invoices => Box::new(Invoices::new(start_date)),
        }
    }

    /// Parse stream names and return them in processing order, deduplicated
    pub fn select<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<StreamKind>> {
        let mut kinds = names
            .into_iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(StreamKind::from_str)
            .collect::<Result<Vec<_>>>()?;
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ORDERED
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::stream_not_found(s))
    }
}

// ============================================================================
// Formatting outcome
// ============================================================================

/// Why a record was not emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The record has no customer GUID to tie it to a customer
    MissingCustomerGuid,
    /// No updated time could be derived from the record
    MissingUpdatedTime,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCustomerGuid => f.write_str("missing customerGuid"),
            Self::MissingUpdatedTime => f.write_str("missing updated time"),
        }
    }
}

/// Result of formatting a raw record
#[derive(Debug, Clone, PartialEq)]
pub enum Formatted {
    /// Emit this record
    Record(Record),
    /// Skip the record
    Dropped(DropReason),
}

impl Formatted {
    /// The formatted record, if it was kept
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Dropped(_) => None,
        }
    }

    /// Check if the record was dropped
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }
}

// ============================================================================
// Stream trait
// ============================================================================

/// Contract implemented by every extracted entity type
pub trait TapStream: Send + Sync {
    /// Which stream this is
    fn kind(&self) -> StreamKind;

    /// Stream name as used in catalogs, state and output
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Response key holding a page's records
    fn records_key(&self) -> &'static str {
        self.kind().name()
    }

    /// Fields that uniquely identify a record
    fn key_properties(&self) -> &'static [&'static str];

    /// Field holding the record's primary modification time
    fn updated_field(&self) -> &'static str;

    /// Whether the stream can be paged through on its own.
    ///
    /// Streams that cannot are only reachable through references on other
    /// streams' records.
    fn enumerable(&self) -> bool {
        true
    }

    /// URL of one page of a facility's collection.
    ///
    /// `bookmark` is the stored high-water mark; streams with a server-side
    /// start filter use it to narrow the result set.
    fn build_url(
        &self,
        base: &Url,
        facility: &Facility,
        page: u32,
        _bookmark: Option<&Timestamp>,
    ) -> Result<Url> {
        facility_url(base, self.name(), facility, page)
    }

    /// Instant of the record's latest change
    fn updated_time(&self, record: &Record, _facility: &Facility) -> Result<Option<Timestamp>> {
        field_time(record, self.updated_field(), None)
    }

    /// Instant the record was created
    fn created_time(&self, record: &Record, facility: &Facility) -> Result<Option<Timestamp>>;

    /// Normalize a raw record for output, or drop it
    fn format_record(&self, record: Record, facility: &Facility) -> Result<Formatted>;

    /// Customer referenced by the record, if the stream carries one
    fn customer_guid<'a>(&self, _record: &'a Record) -> Option<&'a str> {
        None
    }
}

// ============================================================================
// Helpers shared by stream implementations
// ============================================================================

/// `{base}/{resource}/facility/{code}?page={page}`
pub fn facility_url(base: &Url, resource: &str, facility: &Facility, page: u32) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::invalid_value("base_url", format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend([resource, "facility", facility.code.as_str()]);
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Read a date field as a UTC instant, interpreting it in `tz` (UTC if `None`)
pub fn field_time(record: &Record, field: &str, tz: Option<Tz>) -> Result<Option<Timestamp>> {
    let path = FieldPath::parse(field);
    Ok(normalize_value(path.get(record), tz)?.map(|dt| dt.with_timezone(&Utc)))
}

/// Rewrite a date field in place as an ISO string (`null` for the zero
/// date). Missing fields are left missing.
pub fn iso_field(record: &mut Record, field: &str, tz: Option<Tz>) -> Result<()> {
    FieldPath::parse(field).update(record, |value| {
        Ok::<_, Error>(
            normalize_value(Some(value), tz)?
                .map_or(JsonValue::Null, |dt| JsonValue::String(timestamp::to_iso(&dt))),
        )
    })?;
    Ok(())
}

/// Non-empty customer GUID of a record
pub fn customer_guid(record: &Record) -> Option<&str> {
    record
        .get(CUSTOMER_GUID_FIELD)
        .and_then(JsonValue::as_str)
        .filter(|guid| !guid.is_empty())
}

/// Tag a record with the facility it was extracted from
pub fn inject_facility(record: &mut Record, facility: &Facility) {
    record.insert(
        FACILITY_CODE_FIELD.to_string(),
        JsonValue::String(facility.code.clone()),
    );
}
