//! Customers stream
//!
//! The API cannot list all customers. Customers are discovered through the
//! GUIDs on bookings and fetched in batches by GUID.

use super::{
    customer_guid, facility_url, field_time, inject_facility, iso_field, DropReason, Formatted,
    StreamKind, TapStream,
};
use crate::config::Facility;
use crate::error::Result;
use crate::types::{Record, Timestamp};
use url::Url;

const LAST_RECORD_EDIT: &str = "lastRecordEdit";
const CUSTOMER_CREATED: &str = "customerCreated";
const GUID_PARAM: &str = "customerGuid";

/// Customers referenced by other streams
#[derive(Debug, Clone, Default)]
pub struct Customers;

impl Customers {
    /// Create the customers stream
    pub fn new() -> Self {
        Self
    }

    /// URL of one page of the customers with the given GUIDs
    pub fn lookup_url(
        &self,
        base: &Url,
        facility: &Facility,
        guids: &[String],
        page: u32,
    ) -> Result<Url> {
        let mut url = facility_url(base, self.name(), facility, page)?;
        url.query_pairs_mut()
            .append_pair(GUID_PARAM, &guids.join(","));
        Ok(url)
    }
}

impl TapStream for Customers {
    fn kind(&self) -> StreamKind {
        StreamKind::Customers
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["customerGuid"]
    }

    fn updated_field(&self) -> &'static str {
        LAST_RECORD_EDIT
    }

    fn enumerable(&self) -> bool {
        false
    }

    fn created_time(&self, record: &Record, _facility: &Facility) -> Result<Option<Timestamp>> {
        field_time(record, CUSTOMER_CREATED, None)
    }

    fn format_record(&self, mut record: Record, facility: &Facility) -> Result<Formatted> {
        if customer_guid(&record).is_none() {
            return Ok(Formatted::Dropped(DropReason::MissingCustomerGuid));
        }

        iso_field(&mut record, LAST_RECORD_EDIT, None)?;
        iso_field(&mut record, CUSTOMER_CREATED, None)?;
        inject_facility(&mut record, facility);
        Ok(Formatted::Record(record))
    }

    fn customer_guid<'a>(&self, record: &'a Record) -> Option<&'a str> {
        customer_guid(record)
    }
}
