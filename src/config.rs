//! Tap configuration
//!
//! The configuration is a JSON document passed to the tap on the command
//! line. It carries the API credentials, the facilities to extract and
//! optional tuning for the HTTP client and the first full run.
//!
//! ```json
//! {
//!   "api_user": "user",
//!   "api_key": "secret",
//!   "facilities": {
//!     "ABC": { "timezone": "America/Denver" },
//!     "XYZ": { "timezone": "America/New_York" }
//!   },
//!   "start_date": "2025-01-01 00:00:00"
//! }
//! ```

use crate::error::{Error, Result};
use crate::streams::StreamKind;
use crate::timestamp::DATE_FORMAT;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.rockgympro.com/v1";

/// Lower bound for the first full run when no bookmark exists
pub const DEFAULT_START_DATE: &str = "2025-01-01 00:00:00";

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// API user (HTTP basic auth username)
    pub api_user: String,

    /// API key (HTTP basic auth password)
    pub api_key: String,

    /// Base URL for API requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Facilities to extract, keyed by facility code
    #[serde(default)]
    pub facilities: BTreeMap<String, FacilityConfig>,

    /// Timezone for facilities that do not set one.
    ///
    /// Left unset, a facility without a timezone is a configuration error.
    #[serde(default)]
    pub default_timezone: Option<String>,

    /// Lower bound for streams with a server-side start filter, used until a
    /// bookmark exists (`%Y-%m-%d %H:%M:%S`)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Streams to extract (all when unset)
    #[serde(default)]
    pub streams: Option<Vec<String>>,

    /// Maximum number of customer GUIDs per lookup request
    #[serde(default = "default_customer_batch_size")]
    pub customer_batch_size: usize,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_customer_batch_size() -> usize {
    50
}

/// Per-facility configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// IANA timezone name (e.g. "America/Denver")
    #[serde(default)]
    pub timezone: Option<String>,
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Client-side request pacing (no pacing when unset)
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            requests_per_second: None,
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl HttpConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// ============================================================================
// Facility
// ============================================================================

/// A facility with its timezone resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    /// Facility code as used in API paths
    pub code: String,
    /// Timezone used to interpret facility-local timestamps
    pub timezone: Tz,
}

impl Facility {
    /// Create a facility
    pub fn new(code: impl Into<String>, timezone: Tz) -> Self {
        Self {
            code: code.into(),
            timezone,
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl TapConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Parse configuration from a JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Check the configuration for obvious mistakes before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.api_user.trim().is_empty() {
            return Err(Error::missing_field("api_user"));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        if self.facilities.is_empty() {
            return Err(Error::missing_field("facilities"));
        }
        if self.customer_batch_size == 0 {
            return Err(Error::invalid_value(
                "customer_batch_size",
                "must be at least 1",
            ));
        }
        self.base_url()?;
        self.start_date()?;
        self.selected_streams()?;
        self.facilities()?;
        Ok(())
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| Error::invalid_value("base_url", e.to_string()))
    }

    /// Parsed start date, falling back to [`DEFAULT_START_DATE`]
    pub fn start_date(&self) -> Result<NaiveDateTime> {
        let raw = self.start_date.as_deref().unwrap_or(DEFAULT_START_DATE);
        NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| Error::invalid_value("start_date", format!("'{raw}': {e}")))
    }

    /// Facilities with resolved timezones, ordered by code.
    ///
    /// A facility without a timezone takes `default_timezone` (with a
    /// warning). Without either, the facility is rejected.
    pub fn facilities(&self) -> Result<Vec<Facility>> {
        let default_tz = self
            .default_timezone
            .as_deref()
            .map(|name| parse_timezone("default_timezone", name))
            .transpose()?;

        self.facilities
            .iter()
            .map(|(code, facility)| {
                let timezone = match (&facility.timezone, default_tz) {
                    (Some(name), _) => parse_timezone(&format!("facilities.{code}.timezone"), name)?,
                    (None, Some(tz)) => {
                        warn!(
                            "Facility {code} has no timezone, using default_timezone {}",
                            tz.name()
                        );
                        tz
                    }
                    (None, None) => {
                        return Err(Error::MissingTimezone {
                            facility: code.clone(),
                        })
                    }
                };
                Ok(Facility::new(code.clone(), timezone))
            })
            .collect()
    }

    /// Selected streams in processing order
    pub fn selected_streams(&self) -> Result<Vec<StreamKind>> {
        match &self.streams {
            None => Ok(StreamKind::ORDERED.to_vec()),
            Some(names) => StreamKind::select(names.iter().map(String::as_str)),
        }
    }
}

fn parse_timezone(field: &str, name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::invalid_value(field, format!("unknown timezone '{name}': {e}")))
}
