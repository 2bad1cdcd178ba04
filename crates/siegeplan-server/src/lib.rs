// Local proxy for siegeplan: relays player lookups to the stats provider and
// strategy requests to the generative service, keeping both credentials
// server-side.

pub mod api;
pub mod config;
pub mod tracker;

use std::sync::Arc;

use siegeplan_llm::GeminiClient;

use crate::api::AppState;
use crate::config::Config;
use crate::tracker::TrackerClient;

/// Build the production application state from a loaded config.
pub fn build_state(config: &Config) -> AppState {
    let profiles = TrackerClient::new(
        config.credentials.tracker_api_key.clone(),
        config.tracker.base_url.clone(),
    );
    let generator = GeminiClient::new(
        config.credentials.gemini_api_key.clone(),
        config.gemini.model.clone(),
    )
    .with_base_url(config.gemini.base_url.clone())
    .with_temperature(config.gemini.temperature);

    AppState::new(Arc::new(profiles), Arc::new(generator))
}
