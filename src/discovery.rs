//! API base-URL discovery
//!
//! A contract address can live behind the production, staging, or dev API.
//! Discovery probes the candidates in order with a status GET for the
//! contract, short-circuits on the first that responds, and caches the
//! winner for the lifetime of the client instance. A configured static URL
//! wins outright and no probe is ever issued.

use crate::{Result, SdkError};
use std::future::Future;
use std::sync::Mutex;

/// Candidate base URLs, probed in order.
pub const API_CANDIDATES: [&str; 3] = [
    "https://api.chainpay.network",
    "https://api.staging.chainpay.network",
    "https://api.dev.chainpay.network",
];

/// Resolves and caches the API base URL for one client.
#[derive(Debug)]
pub struct ApiDiscovery {
    override_url: Option<String>,
    candidates: Vec<String>,
    cached: Mutex<Option<String>>,
}

impl ApiDiscovery {
    /// Discovery over the default candidate list; `override_url` pins the
    /// base URL and disables probing.
    pub fn new(override_url: Option<String>) -> Self {
        Self {
            override_url,
            candidates: API_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            cached: Mutex::new(None),
        }
    }

    /// Replace the candidate list.
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Resolve the base URL, issuing `probe` against candidates on a cache
    /// miss. `probe` succeeds iff the candidate answered the status GET.
    pub async fn resolve<F, Fut>(&self, probe: F) -> Result<String>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if let Some(url) = &self.override_url {
            return Ok(url.clone());
        }
        if let Some(url) = self.cached()? {
            return Ok(url);
        }

        for base in &self.candidates {
            match probe(base.clone()).await {
                Ok(()) => {
                    tracing::debug!(%base, "subscription api endpoint discovered");
                    *self
                        .cached
                        .lock()
                        .map_err(|_| SdkError::Api("discovery cache lock poisoned".to_string()))? =
                        Some(base.clone());
                    return Ok(base.clone());
                }
                Err(e) => {
                    tracing::debug!(%base, error = %e, "candidate api did not respond");
                }
            }
        }

        Err(SdkError::ApiUnreachable)
    }

    fn cached(&self) -> Result<Option<String>> {
        Ok(self
            .cached
            .lock()
            .map_err(|_| SdkError::Api("discovery cache lock poisoned".to_string()))?
            .clone())
    }
}
