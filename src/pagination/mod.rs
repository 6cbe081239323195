//! Pagination module
//!
//! The API pages every collection with a `page` query parameter starting at
//! 1 and reports progress in an `rgpApiPaging` block:
//!
//! ```json
//! {
//!   "bookings": [ ... ],
//!   "rgpApiPaging": { "page": 1, "pageTotal": 4, "itemTotal": 392 }
//! }
//! ```
//!
//! A walk stops at the first empty page or once the reported total is
//! reached, whichever comes first.

mod types;

pub use types::{NextPage, Page, PageInfo, PaginationState, FIRST_PAGE, PAGING_KEY};
