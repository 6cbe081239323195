// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-rockgympro
//!
//! Incremental extraction of bookings, invoices and customers from the
//! RockGymPro API, emitted as singer messages.
//!
//! ## Features
//!
//! - **Per-facility bookmarks**: Only records changed since the last run are emitted
//! - **Rate-limit backoff**: Throttled requests wait out `retry-after` and retry
//! - **Customer resolution**: Customers referenced by bookings are looked up in batches
//! - **Timezone-aware timestamps**: Facility-local wall clock times become ISO instants
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_rockgympro::config::TapConfig;
//! use tap_rockgympro::engine::SyncEngine;
//! use tap_rockgympro::http::HttpClient;
//! use tap_rockgympro::output::JsonLinesSink;
//! use tap_rockgympro::state::StateManager;
//! use tap_rockgympro::streams::StreamKind;
//!
//! #[tokio::main]
//! async fn main() -> tap_rockgympro::Result<()> {
//!     let config = TapConfig::from_json(&std::fs::read_to_string("config.json")?)?;
//!     config.validate()?;
//!
//!     let client = HttpClient::from_tap_config(&config)?;
//!     let mut engine = SyncEngine::new(client, config.base_url()?, StateManager::in_memory());
//!     let mut sink = JsonLinesSink::stdout();
//!
//!     let invoices = StreamKind::Invoices.stream(config.start_date()?);
//!     for facility in config.facilities()? {
//!         engine.sync_stream(invoices.as_ref(), &facility, &mut sink, None).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 CLI: discover / read / streams               │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬───────────┐
//! │  Config  │   HTTP    │    Engine     │   State   │  Output   │
//! ├──────────┼───────────┼───────────────┼───────────┼───────────┤
//! │ Facility │ Basic auth│ Page walk     │ Bookmarks │ SCHEMA    │
//! │ Timezone │ 429 wait  │ Customer      │ JSON file │ RECORD    │
//! │ Streams  │ Pacing    │ resolver      │           │ STATE     │
//! └──────────┴───────────┴───────────────┴───────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Date parsing and ISO formatting
pub mod timestamp;

/// Dot-path access into JSON records
pub mod record;

/// Tap configuration
pub mod config;

/// HTTP client with rate-limit backoff
pub mod http;

/// Page walking over the API's paginated collections
pub mod pagination;

/// Stream definitions
pub mod streams;

/// Bookmark persistence
pub mod state;

/// Singer message output
pub mod output;

/// Bundled schemas and discovery
pub mod schema;

/// Page walk and customer resolution
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{Facility, TapConfig};
pub use engine::{CustomerResolver, SyncEngine, SyncStats};
pub use state::{BookmarkStore, StateManager};
pub use streams::{StreamKind, TapStream};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
