//! Per-client SDK configuration
//!
//! Every tunable lives on the client instance — there is no process-global
//! state, so independent clients (e.g. in tests) never interfere.

use std::time::Duration;

/// Default pause between reconciliation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(6000);
/// Default number of reconciliation polls before giving up.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 5;
/// Default timeout for every HTTP call to the subscription API.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(3000);

/// SDK configuration.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Static API base URL. When set, endpoint discovery is skipped.
    pub api_base_url: Option<String>,
    /// Pause between reconciliation polls.
    pub poll_interval: Duration,
    /// Number of polls before a reconciliation loop times out. The loop's
    /// deadline is `poll_interval * max_poll_attempts` from entry.
    pub max_poll_attempts: u32,
    /// Timeout applied to every subscription-API HTTP call.
    pub http_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl SdkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the API base URL, bypassing discovery.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the reconciliation poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the reconciliation attempt bound.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}
