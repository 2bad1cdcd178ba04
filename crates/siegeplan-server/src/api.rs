// HTTP API: the player-stats relay, strategy generation, and a health check.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use siegeplan_core::stats::{Platform, PlayerStats};
use siegeplan_llm::{build_request, PromptError, StrategyGenerator};

use crate::tracker::{ProfileError, ProfileSource};

pub const SERVICE_NAME: &str = "siegeplan-server";

// ── Request types ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateStrategyRequest {
    #[serde(default)]
    pub players: Vec<RosterEntry>,
    pub map: String,
    pub site: String,
}

/// A roster slot as sent by the front end. Only the stats matter here;
/// other fields (id, loading flags) are ignored.
#[derive(Debug, Deserialize)]
pub struct RosterEntry {
    #[serde(default)]
    pub stats: Option<PlayerStats>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileSource>,
    pub generator: Arc<dyn StrategyGenerator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(profiles: Arc<dyn ProfileSource>, generator: Arc<dyn StrategyGenerator>) -> Self {
        Self {
            profiles,
            generator,
            started_at: Utc::now(),
        }
    }
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "message": msg }))).into_response()
}

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/player/{platform}/{username}", get(get_player))
        .route("/api/generate-strategy", post(generate_strategy))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "startedAt": state.started_at.to_rfc3339(),
    }))
    .into_response()
}

async fn get_player(
    State(state): State<AppState>,
    Path((platform, username)): Path<(String, String)>,
) -> Response {
    let Ok(platform) = platform.parse::<Platform>() else {
        info!(%platform, %username, "Lookup for unknown platform");
        return json_message(
            StatusCode::NOT_FOUND,
            &format!("Player '{username}' not found on {platform}"),
        );
    };

    match state.profiles.get_profile(platform, &username).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(ProfileError::NotFound(msg)) => json_message(StatusCode::NOT_FOUND, &msg),
        Err(ProfileError::Upstream(msg)) => json_message(StatusCode::BAD_GATEWAY, &msg),
    }
}

async fn generate_strategy(
    State(state): State<AppState>,
    body: Result<Json<GenerateStrategyRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(%rejection, "Rejected generation request body");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid request body");
        }
    };

    let stats: Vec<PlayerStats> = req.players.into_iter().filter_map(|p| p.stats).collect();
    let prompt = match build_request(&stats, &req.map, &req.site) {
        Ok(prompt) => prompt,
        Err(PromptError::NoStatsAvailable) => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "No players with stats provided",
            );
        }
        Err(e) => {
            error!(%e, "Failed to build prompt");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate strategy");
        }
    };

    match state.generator.generate(&prompt).await {
        Ok(strategy) => {
            info!(
                title = %strategy.strategy_title,
                roles = strategy.player_roles.len(),
                "Strategy generated"
            );
            (StatusCode::OK, Json(strategy)).into_response()
        }
        Err(e) => {
            error!(%e, map = %req.map, site = %req.site, "Strategy generation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate strategy")
        }
    }
}
