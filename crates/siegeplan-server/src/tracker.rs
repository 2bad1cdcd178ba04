// Stats provider relay.
//
// Holds the provider credential server-side and forwards player lookups,
// translating provider failures into a two-way taxonomy: the player does not
// exist on that platform, or the provider could not serve the request.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use siegeplan_core::stats::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

/// Source of raw player profiles.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_profile(&self, platform: Platform, username: &str)
        -> Result<Value, ProfileError>;
}

// ---------------------------------------------------------------------------
// TrackerClient
// ---------------------------------------------------------------------------

pub struct TrackerClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TrackerClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// `{base}/{provider_platform}/{username}`, with the username encoded as
    /// a single path segment.
    fn profile_url(&self, platform: Platform, username: &str) -> Result<reqwest::Url, ProfileError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            warn!(base_url = %self.base_url, ?e, "Invalid stats provider URL");
            ProfileError::Upstream("Stats provider is misconfigured".into())
        })?;
        url.path_segments_mut()
            .map_err(|_| ProfileError::Upstream("Stats provider is misconfigured".into()))?
            .pop_if_empty()
            .push(platform.provider_code())
            .push(username);
        Ok(url)
    }
}

#[async_trait]
impl ProfileSource for TrackerClient {
    async fn get_profile(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Value, ProfileError> {
        let url = self.profile_url(platform, username)?;
        debug!(%url, "Forwarding profile lookup");

        let response = self
            .http
            .get(url)
            .header("TRN-Api-Key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%platform, username, ?e, "Stats provider unreachable");
                ProfileError::Upstream("Could not reach the stats provider".into())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!(%platform, username, "Player not found");
            return Err(ProfileError::NotFound(format!(
                "Player '{username}' not found on {}",
                platform.display_str()
            )));
        }
        if !status.is_success() {
            warn!(%platform, username, %status, "Stats provider error");
            return Err(ProfileError::Upstream(format!(
                "Stats provider returned status {}",
                status.as_u16()
            )));
        }

        let profile = response.json::<Value>().await.map_err(|e| {
            warn!(%platform, username, ?e, "Stats provider returned a non-JSON body");
            ProfileError::Upstream("Stats provider returned an unreadable response".into())
        })?;
        info!(%platform, username, "Profile fetched");
        Ok(profile)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
