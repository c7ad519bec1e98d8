//! # Core Configuration Module
//!
//! Provides configuration management for the synchronized playlists core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the injected bridges and the tuning knobs of the sync
//! engine. It enforces fail-fast validation so a misconfigured host finds out
//! at startup rather than in the middle of a cover upload.
//!
//! ## Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `Sleeper` - Delays between retry attempts (desktop default: tokio timer)
//!
//! When the `desktop-shims` feature is enabled, the desktop defaults are
//! injected automatically if not provided. Without it both are required.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .cover_retry_delay(Duration::from_millis(250))
//!     .cover_retry_max_attempts(Some(40))
//!     .enable_request_cache(true)
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CoreConfigBuilder::from_env`] seeds a builder from:
//!
//! | Variable                         | Setting                      |
//! |----------------------------------|------------------------------|
//! | `SYNC_API_BASE_URL`              | `api_base_url`               |
//! | `SYNC_COVER_RETRY_DELAY_MS`      | `cover_retry_delay`          |
//! | `SYNC_COVER_RETRY_MAX_ATTEMPTS`  | `cover_retry_max_attempts`   |
//! | `SYNC_COVER_POLL_ATTEMPTS`       | `cover_poll_attempts`        |

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, Sleeper};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default Web API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Fixed delay between cover upload attempts
pub const DEFAULT_COVER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Delay between cover visibility checks
pub const DEFAULT_COVER_POLL_DELAY: Duration = Duration::from_millis(500);

/// Number of cover visibility checks before giving up
pub const DEFAULT_COVER_POLL_ATTEMPTS: u32 = 5;

/// Default number of cached GET responses
pub const DEFAULT_REQUEST_CACHE_CAPACITY: usize = 256;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_API_BASE_URL: &str = "SYNC_API_BASE_URL";
const ENV_COVER_RETRY_DELAY_MS: &str = "SYNC_COVER_RETRY_DELAY_MS";
const ENV_COVER_RETRY_MAX_ATTEMPTS: &str = "SYNC_COVER_RETRY_MAX_ATTEMPTS";
const ENV_COVER_POLL_ATTEMPTS: &str = "SYNC_COVER_POLL_ATTEMPTS";

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for API and cover requests
    pub http_client: Arc<dyn HttpClient>,

    /// Delay source for the retry and poll loops
    pub sleeper: Arc<dyn Sleeper>,

    /// Web API root, without trailing slash
    pub api_base_url: String,

    /// Per-request timeout applied to API calls
    pub request_timeout: Duration,

    /// Fixed delay between cover upload attempts
    pub cover_retry_delay: Duration,

    /// Cap on cover upload attempts; `None` retries until the upload succeeds
    pub cover_retry_max_attempts: Option<u32>,

    /// Delay between cover visibility checks
    pub cover_poll_delay: Duration,

    /// Number of cover visibility checks
    pub cover_poll_attempts: u32,

    /// Event bus channel capacity
    pub event_buffer_size: usize,

    /// Number of GET responses kept by the request cache
    pub request_cache_capacity: usize,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("sleeper", &"Sleeper { ... }")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("cover_retry_delay", &self.cover_retry_delay)
            .field("cover_retry_max_attempts", &self.cover_retry_max_attempts)
            .field("cover_poll_delay", &self.cover_poll_delay)
            .field("cover_poll_attempts", &self.cover_poll_attempts)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("request_cache_capacity", &self.request_cache_capacity)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Memoize GET responses between writes
    pub enable_request_cache: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The API base URL is an absolute http(s) URL
    /// - Retry caps and poll counts are non-zero when set
    /// - The event buffer and request cache have room for at least one entry
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://"))
        {
            return Err(Error::Config(format!(
                "API base URL must be an absolute http(s) URL, got {:?}",
                self.api_base_url
            )));
        }

        if self.api_base_url.ends_with('/') {
            return Err(Error::Config(
                "API base URL must not end with a slash".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.cover_retry_max_attempts == Some(0) {
            return Err(Error::Config(
                "Cover retry cap must be at least 1 attempt. \
                 Use None to retry until the upload succeeds."
                    .to_string(),
            ));
        }

        if self.cover_poll_attempts == 0 {
            return Err(Error::Config(
                "Cover poll attempts must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.features.enable_request_cache && self.request_cache_capacity == 0 {
            return Err(Error::Config(
                "Request cache enabled but its capacity is 0. \
                 Disable the feature or set a positive capacity."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::try_with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for API requests. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform HTTP client."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_sleeper() -> Result<Arc<dyn Sleeper>> {
    Ok(Arc::new(bridge_desktop::TokioSleeper))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_sleeper() -> Result<Arc<dyn Sleeper>> {
    Err(Error::CapabilityMissing {
        capability: "Sleeper".to_string(),
        message: "Sleeper implementation is required for cover retry delays. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioSleeper. \
                 Other hosts: inject a timer-backed sleeper."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    api_base_url: Option<String>,
    request_timeout: Option<Duration>,
    cover_retry_delay: Option<Duration>,
    cover_retry_max_attempts: Option<u32>,
    cover_poll_delay: Option<Duration>,
    cover_poll_attempts: Option<u32>,
    event_buffer_size: Option<usize>,
    request_cache_capacity: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Seeds a builder from the process environment.
    ///
    /// Unset variables leave the default in place; set but unparseable
    /// variables are a configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seeds a builder from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(url) = lookup(ENV_API_BASE_URL) {
            builder = builder.api_base_url(url);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_COVER_RETRY_DELAY_MS)? {
            builder = builder.cover_retry_delay(Duration::from_millis(ms));
        }
        if let Some(cap) = parse_var::<u32, _>(&lookup, ENV_COVER_RETRY_MAX_ATTEMPTS)? {
            builder = builder.cover_retry_max_attempts(Some(cap));
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, ENV_COVER_POLL_ATTEMPTS)? {
            builder = builder.cover_poll_attempts(attempts);
        }

        Ok(builder)
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the sleeper implementation.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Sets the Web API root.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the fixed delay between cover upload attempts.
    pub fn cover_retry_delay(mut self, delay: Duration) -> Self {
        self.cover_retry_delay = Some(delay);
        self
    }

    /// Caps cover upload attempts. `None` (the default) never gives up.
    pub fn cover_retry_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.cover_retry_max_attempts = max_attempts;
        self
    }

    /// Sets the delay between cover visibility checks.
    pub fn cover_poll_delay(mut self, delay: Duration) -> Self {
        self.cover_poll_delay = Some(delay);
        self
    }

    /// Sets the number of cover visibility checks.
    pub fn cover_poll_attempts(mut self, attempts: u32) -> Self {
        self.cover_poll_attempts = Some(attempts);
        self
    }

    /// Sets the event bus channel capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the number of GET responses the request cache keeps.
    pub fn request_cache_capacity(mut self, capacity: usize) -> Self {
        self.request_cache_capacity = Some(capacity);
        self
    }

    /// Enables or disables the GET response cache.
    pub fn enable_request_cache(mut self, enabled: bool) -> Self {
        self.features.enable_request_cache = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A bridge is missing and no platform default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let sleeper = match self.sleeper {
            Some(sleeper) => sleeper,
            None => provide_default_sleeper()?,
        };

        let config = CoreConfig {
            http_client,
            sleeper,
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout,
            cover_retry_delay: self.cover_retry_delay.unwrap_or(DEFAULT_COVER_RETRY_DELAY),
            cover_retry_max_attempts: self.cover_retry_max_attempts,
            cover_poll_delay: self.cover_poll_delay.unwrap_or(DEFAULT_COVER_POLL_DELAY),
            cover_poll_attempts: self
                .cover_poll_attempts
                .unwrap_or(DEFAULT_COVER_POLL_ATTEMPTS),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            request_cache_capacity: self
                .request_cache_capacity
                .unwrap_or(DEFAULT_REQUEST_CACHE_CAPACITY),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Invalid value {:?} for {}: {}", raw, key, e)))
        })
        .transpose()
}
