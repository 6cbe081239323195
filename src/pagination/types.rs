//! Pagination types
//!
//! Page extraction and stop detection for the page-number pagination used by
//! every RockGymPro collection endpoint.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};

/// First page number accepted by the API
pub const FIRST_PAGE: u32 = 1;

/// Key of the paging metadata block in every collection response
pub const PAGING_KEY: &str = "rgpApiPaging";

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available, fetch this page number next
    Continue(u32),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Paging metadata reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Page number the API says it returned
    pub page: Option<u32>,
    /// Total number of pages
    pub page_total: Option<u32>,
    /// Total number of items across all pages
    pub item_total: Option<u64>,
}

impl PageInfo {
    /// Read paging metadata from a response body. Missing or malformed
    /// fields are left unset.
    pub fn from_body(body: &JsonValue) -> Self {
        let Some(paging) = body.get(PAGING_KEY) else {
            return Self::default();
        };
        Self {
            page: number_field(paging, "page").and_then(|n| u32::try_from(n).ok()),
            page_total: number_field(paging, "pageTotal").and_then(|n| u32::try_from(n).ok()),
            item_total: number_field(paging, "itemTotal"),
        }
    }

    /// Whether the API reports more pages after `current`.
    ///
    /// Without a reported total the caller relies on an empty page to stop.
    pub fn has_more_after(&self, current: u32) -> bool {
        self.page_total.map_or(true, |total| current < total)
    }
}

/// Numeric paging field; the API sends some of these as strings
fn number_field(paging: &JsonValue, key: &str) -> Option<u64> {
    match paging.get(key)? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One page of raw records
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number that was requested
    pub number: u32,
    /// Records in API order
    pub records: Vec<Record>,
    /// Paging metadata
    pub info: PageInfo,
}

impl Page {
    /// Extract the records stored under `records_key` from a response body.
    ///
    /// A missing or `null` key is an empty page. Anything other than an
    /// array of objects is an error.
    pub fn from_body(number: u32, body: &JsonValue, records_key: &str) -> Result<Self> {
        let records = match body.get(records_key) {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().cloned().ok_or_else(|| {
                        Error::extraction(records_key, format!("item {i} is not an object"))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::extraction(
                    records_key,
                    format!("expected an array, found {}", json_type(other)),
                ))
            }
        };

        Ok(Self {
            number,
            records,
            info: PageInfo::from_body(body),
        })
    }

    /// Whether the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decide which page to fetch after this one
    pub fn next(&self) -> NextPage {
        if self.is_empty() || !self.info.has_more_after(self.number) {
            NextPage::Done
        } else {
            NextPage::Continue(self.number + 1)
        }
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Tracks pagination progress during a walk
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Page to fetch next
    pub page: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: FIRST_PAGE,
            total_fetched: 0,
            done: false,
        }
    }
}

impl PaginationState {
    /// Create a new pagination state at the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page and move to the page after it
    pub fn advance(&mut self, page: &Page) -> NextPage {
        self.total_fetched += page.records.len() as u64;
        let next = page.next();
        match next {
            NextPage::Continue(n) => self.page = n,
            NextPage::Done => self.done = true,
        }
        next
    }
}
