//! HTTP client module
//!
//! Provides the rate-limit-aware fetcher used for every API call.
//!
//! # Features
//!
//! - **Throttle Backoff**: Waits out `429` responses using `retry-after`
//! - **Client-side Pacing**: Optional token bucket limiter using governor
//! - **Basic Auth**: API user and key on every request

mod client;
mod rate_limit;

pub use client::{
    retry_after_delay, Credentials, HttpClient, HttpClientConfig, HttpClientConfigBuilder,
    MIN_RETRY_AFTER, RATE_LIMITED_STATUS,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
