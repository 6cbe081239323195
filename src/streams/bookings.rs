//! Bookings stream
//!
//! The API has no way to filter bookings by modification time. A booking is
//! created with a `bookingDate` and may later be cancelled, which sets
//! `cancelledOn`; either event can be the latest change. The whole collection
//! is paged through and each booking is compared against the bookmark using
//! the later of the two.

use super::{customer_guid, field_time, inject_facility, iso_field, Formatted, StreamKind, TapStream};
use crate::config::Facility;
use crate::error::Result;
use crate::types::{Record, Timestamp};

const BOOKING_DATE: &str = "bookingDate";
const CANCELLED_ON: &str = "cancelledOn";
const ORIGINAL_BOOKED_TIME: &str = "originalBookedTime";

/// Class and event bookings
#[derive(Debug, Clone, Default)]
pub struct Bookings;

impl Bookings {
    /// Create the bookings stream
    pub fn new() -> Self {
        Self
    }
}

impl TapStream for Bookings {
    fn kind(&self) -> StreamKind {
        StreamKind::Bookings
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["bookingId"]
    }

    fn updated_field(&self) -> &'static str {
        BOOKING_DATE
    }

    fn updated_time(&self, record: &Record, _facility: &Facility) -> Result<Option<Timestamp>> {
        let booked = field_time(record, BOOKING_DATE, None)?;
        let cancelled = field_time(record, CANCELLED_ON, None)?;
        Ok(match (booked, cancelled) {
            (Some(booked), Some(cancelled)) => Some(booked.max(cancelled)),
            (booked, cancelled) => booked.or(cancelled),
        })
    }

    fn created_time(&self, record: &Record, _facility: &Facility) -> Result<Option<Timestamp>> {
        field_time(record, BOOKING_DATE, None)
    }

    fn format_record(&self, mut record: Record, facility: &Facility) -> Result<Formatted> {
        for field in [BOOKING_DATE, ORIGINAL_BOOKED_TIME, CANCELLED_ON] {
            iso_field(&mut record, field, None)?;
        }
        inject_facility(&mut record, facility);
        Ok(Formatted::Record(record))
    }

    fn customer_guid<'a>(&self, record: &'a Record) -> Option<&'a str> {
        customer_guid(record)
    }
}
