//! Invoices stream
//!
//! Invoice and payment dates are facility-local wall-clock strings, so they
//! are interpreted in the facility's timezone. The API filters invoices with
//! a `startDateTime` parameter in the same local time.

use super::{
    customer_guid, facility_url, field_time, inject_facility, iso_field, DropReason, Formatted,
    StreamKind, TapStream,
};
use crate::config::Facility;
use crate::error::Result;
use crate::timestamp::{format_filter, DATE_FORMAT};
use crate::types::{Record, Timestamp};
use chrono::NaiveDateTime;
use url::Url;

const INVOICE_POST_DATE: &str = "invoicePostDate";
const PAYMENT_POST_DATE: &str = "payment.postdate";
const START_PARAM: &str = "startDateTime";

/// Invoices and their payments
#[derive(Debug, Clone)]
pub struct Invoices {
    start_date: NaiveDateTime,
}

impl Invoices {
    /// Create the invoices stream.
    ///
    /// `start_date` bounds the first run for a facility, before any bookmark
    /// exists.
    pub fn new(start_date: NaiveDateTime) -> Self {
        Self { start_date }
    }
}

impl TapStream for Invoices {
    fn kind(&self) -> StreamKind {
        StreamKind::Invoices
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["invoiceId"]
    }

    fn updated_field(&self) -> &'static str {
        INVOICE_POST_DATE
    }

    fn build_url(
        &self,
        base: &Url,
        facility: &Facility,
        page: u32,
        bookmark: Option<&Timestamp>,
    ) -> Result<Url> {
        let mut url = facility_url(base, self.name(), facility, page)?;
        let start = match bookmark {
            Some(ts) => format_filter(ts, facility.timezone),
            None => self.start_date.format(DATE_FORMAT).to_string(),
        };
        url.query_pairs_mut().append_pair(START_PARAM, &start);
        Ok(url)
    }

    fn updated_time(&self, record: &Record, facility: &Facility) -> Result<Option<Timestamp>> {
        field_time(record, INVOICE_POST_DATE, Some(facility.timezone))
    }

    fn created_time(&self, record: &Record, facility: &Facility) -> Result<Option<Timestamp>> {
        field_time(record, INVOICE_POST_DATE, Some(facility.timezone))
    }

    fn format_record(&self, mut record: Record, facility: &Facility) -> Result<Formatted> {
        if customer_guid(&record).is_none() {
            return Ok(Formatted::Dropped(DropReason::MissingCustomerGuid));
        }

        iso_field(&mut record, INVOICE_POST_DATE, Some(facility.timezone))?;
        iso_field(&mut record, PAYMENT_POST_DATE, Some(facility.timezone))?;
        inject_facility(&mut record, facility);
        Ok(Formatted::Record(record))
    }

    fn customer_guid<'a>(&self, record: &'a Record) -> Option<&'a str> {
        customer_guid(record)
    }
}
