// Client for the local siegeplan proxy.
//
// Player lookups come back as the provider's raw profile and are normalized
// here; strategy requests are forwarded as-is.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use siegeplan_core::stats::{normalize_json, NormalizeError, Platform, PlayerStats};
use siegeplan_core::strategy::Strategy;
use siegeplan_core::team::Player;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";
pub const PROXY_URL_VAR: &str = "SIEGEPLAN_PROXY_URL";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not connect to the proxy server. Make sure it is running at {url}.")]
    ProxyUnreachable { url: String },

    /// The proxy answered with an error; carries its message.
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Profile(#[from] NormalizeError),

    #[error("Unexpected response from the proxy: {0}")]
    InvalidResponse(String),
}

/// Fetches and normalizes player statistics.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_stats(&self, username: &str, platform: Platform)
        -> Result<PlayerStats, FetchError>;
}

/// Requests a generated strategy for a set of players and a scenario.
#[async_trait]
pub trait StrategySource: Send + Sync {
    async fn generate_strategy(
        &self,
        players: &[Player],
        map: &str,
        site: &str,
    ) -> Result<Strategy, FetchError>;
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    players: &'a [Player],
    map: &'a str,
    site: &'a str,
}

// ---------------------------------------------------------------------------
// ProxyClient
// ---------------------------------------------------------------------------

pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Proxy URL from `SIEGEPLAN_PROXY_URL`, or the default local address.
    pub fn from_env() -> Self {
        let url = std::env::var(PROXY_URL_VAR)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn player_url(&self, platform: Platform, username: &str) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidResponse(format!("invalid proxy URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidResponse("invalid proxy URL".into()))?
            .pop_if_empty()
            .extend(["api", "player", platform.code(), username]);
        Ok(url)
    }

    fn unreachable(&self, e: reqwest::Error) -> FetchError {
        warn!(url = %self.base_url, ?e, "Proxy request failed");
        FetchError::ProxyUnreachable {
            url: self.base_url.clone(),
        }
    }
}

/// Message from an error body (`{message}` or `{error}`), falling back to
/// the status code.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body: Option<Value> = response.json().await.ok();
    body.as_ref()
        .and_then(|b| b.get("message").or_else(|| b.get("error")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

#[async_trait]
impl StatsSource for ProxyClient {
    async fn fetch_stats(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<PlayerStats, FetchError> {
        let url = self.player_url(platform, username)?;
        debug!(%url, "Fetching player stats");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Api(error_message(response).await));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        Ok(normalize_json(raw, username, platform)?)
    }
}

#[async_trait]
impl StrategySource for ProxyClient {
    async fn generate_strategy(
        &self,
        players: &[Player],
        map: &str,
        site: &str,
    ) -> Result<Strategy, FetchError> {
        let response = self
            .http
            .post(format!("{}/api/generate-strategy", self.base_url))
            .json(&GenerateBody { players, map, site })
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Api(error_message(response).await));
        }

        response
            .json::<Strategy>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
