//! Subscription-management API client
//!
//! Two endpoints, both JSON with a fixed short timeout:
//!
//! - `GET {base}/integration/subscriptions/{contract}/status`
//! - `POST {base}/integration/subscriptions/hint-update-state`
//!
//! Non-2xx responses surface the server's `message` field when present,
//! else the HTTP status text. The trait seam lets tests and alternative
//! transports replace the HTTP implementation.

use crate::config::SdkConfig;
use crate::discovery::ApiDiscovery;
use crate::{Amount, Result, SdkError, SubscriptionStatus};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Remote view of a subscription: status plus remaining allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatusInfo {
    pub status: SubscriptionStatus,
    /// Remaining spender allowance, e.g. `"5 USDC"`.
    pub allowance: Amount,
}

/// Notification that a transaction occurred, prompting the API to re-derive
/// subscription state from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintUpdate {
    /// Confirmed transaction hash.
    pub hash: String,
    /// Network the transaction ran on.
    pub blockchain: String,
}

/// Server acknowledgement of a hint notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintAck {
    pub is_accepted: bool,
}

/// Client for the remote subscription-management API.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Fetch the remote status/allowance view for a contract.
    async fn get_status(&self, contract_address: &str) -> Result<SubscriptionStatusInfo>;

    /// Notify the API that a transaction for this contract was confirmed.
    async fn post_hint(&self, contract_address: &str, hint: &HintUpdate) -> Result<HintAck>;
}

pub(crate) fn status_url(base: &str, contract_address: &str) -> String {
    format!(
        "{}/integration/subscriptions/{}/status",
        base.trim_end_matches('/'),
        contract_address
    )
}

pub(crate) fn hint_url(base: &str) -> String {
    format!(
        "{}/integration/subscriptions/hint-update-state",
        base.trim_end_matches('/')
    )
}

pub(crate) async fn get_json<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> Result<T> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| SdkError::Api(e.to_string()))?;
    decode_response(resp).await
}

pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize>(
    http: &reqwest::Client,
    url: &str,
    body: &B,
) -> Result<T> {
    let resp = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| SdkError::Api(e.to_string()))?;
    decode_response(resp).await
}

async fn decode_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or(fallback);
        return Err(SdkError::Api(message));
    }
    resp.json::<T>()
        .await
        .map_err(|e| SdkError::Api(e.to_string()))
}

/// HTTP implementation of [`SubscriptionApi`] with base-URL discovery.
pub struct HttpSubscriptionApi {
    http: reqwest::Client,
    discovery: ApiDiscovery,
}

impl HttpSubscriptionApi {
    /// Build a client from the SDK configuration. The configured
    /// `api_base_url` (when set) bypasses discovery entirely.
    pub fn new(config: &SdkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| SdkError::Api(e.to_string()))?;
        Ok(Self {
            http,
            discovery: ApiDiscovery::new(config.api_base_url.clone()),
        })
    }

    /// Replace the discovery candidate list (staging/dev setups).
    pub fn with_discovery(mut self, discovery: ApiDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    async fn resolve_base(&self, contract_address: &str) -> Result<String> {
        let http = self.http.clone();
        let contract = contract_address.to_string();
        self.discovery
            .resolve(move |base| {
                let http = http.clone();
                let contract = contract.clone();
                async move {
                    get_json::<SubscriptionStatusInfo>(&http, &status_url(&base, &contract))
                        .await
                        .map(|_| ())
                }
            })
            .await
    }
}

#[async_trait]
impl SubscriptionApi for HttpSubscriptionApi {
    async fn get_status(&self, contract_address: &str) -> Result<SubscriptionStatusInfo> {
        let base = self.resolve_base(contract_address).await?;
        get_json(&self.http, &status_url(&base, contract_address)).await
    }

    async fn post_hint(&self, contract_address: &str, hint: &HintUpdate) -> Result<HintAck> {
        let base = self.resolve_base(contract_address).await?;
        post_json(&self.http, &hint_url(&base), hint).await
    }
}
