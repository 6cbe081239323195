//! HTTP client with rate-limit backoff
//!
//! The RockGymPro API reports throttling inside the JSON body
//! (`{"status": 429, ...}`) as well as through the HTTP status line, and
//! tells the caller how long to wait with a `retry-after` header. The client:
//! - Decodes the body regardless of HTTP status
//! - Sleeps for `retry-after` (at least one second) and retries on 429,
//!   with no retry ceiling
//! - Surfaces every other failure to the caller without retrying

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Status code the API uses to signal throttling
pub const RATE_LIMITED_STATUS: u16 = 429;

/// Shortest backoff when the API is throttling
pub const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);

/// HTTP basic auth credentials
#[derive(Clone)]
pub struct Credentials {
    /// API user
    pub username: String,
    /// API key
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Optional client-side pacing
    pub rate_limit: Option<RateLimiterConfig>,
    /// Basic auth credentials
    pub credentials: Option<Credentials>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: None,
            credentials: None,
            user_agent: format!("tap-rockgympro/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Build the client config from the tap configuration
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let mut builder = Self::builder()
            .timeout(config.http.timeout())
            .basic_auth(&config.api_user, &config.api_key);
        if let Some(rps) = config.http.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        if let Some(agent) = &config.http.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set basic auth credentials
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client that waits out API throttling
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create a client from the tap configuration
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_tap_config(config))
    }

    /// Check if client-side pacing is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Throttled responses are retried after the server-provided delay for as
    /// long as the API keeps throttling. Any other failure is returned.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value> {
        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.get(url.clone());
            if let Some(ref creds) = self.config.credentials {
                req = req.basic_auth(&creds.username, Some(&creds.password));
            }

            let response = req.send().await?;
            let status = response.status();
            let delay = retry_after_delay(response.headers());
            let text = response.text().await?;
            let body: Option<Value> = serde_json::from_str(&text).ok();

            if status == StatusCode::TOO_MANY_REQUESTS
                || body_status(body.as_ref()) == Some(RATE_LIMITED_STATUS)
            {
                info!("Hit rate limit. Waiting {} seconds", delay.as_secs());
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(Error::http_status(status.as_u16(), text));
            }

            let body = body.ok_or_else(|| {
                Error::decode(format!("Response from {} is not valid JSON", url.path()))
            })?;

            if let Some(code) = body_status(Some(&body)).filter(|code| *code >= 400) {
                return Err(Error::http_status(code, text));
            }

            debug!("Request succeeded: GET {url}");
            return Ok(body);
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Status code embedded in a response body, if any
fn body_status(body: Option<&Value>) -> Option<u16> {
    body?
        .get("status")?
        .as_u64()
        .and_then(|s| u16::try_from(s).ok())
}

/// Backoff requested by a throttled response.
///
/// Reads `retry-after` as whole seconds; missing, unparseable or
/// non-positive values fall back to [`MIN_RETRY_AFTER`].
pub fn retry_after_delay(headers: &HeaderMap) -> Duration {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| u64::try_from(secs).ok())
        .map(Duration::from_secs)
        .map_or(MIN_RETRY_AFTER, |d| d.max(MIN_RETRY_AFTER))
}
