// Prompt construction for strategy generation.
//
// Player stats are reduced to a compact summary (no display labels, no kill
// counts) before being embedded, so the model reasons over the numbers that
// matter and the prompt stays deterministic for a given roster and scenario.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use siegeplan_core::stats::{Platform, PlayerStats};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The per-player data the model sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub username: String,
    pub platform: Platform,
    pub level: f64,
    pub kd_ratio: f64,
    pub win_rate: f64,
    pub top_attackers: Vec<String>,
    pub top_defenders: Vec<String>,
}

impl From<&PlayerStats> for PlayerSummary {
    fn from(stats: &PlayerStats) -> Self {
        PlayerSummary {
            username: stats.username.clone(),
            platform: stats.platform,
            level: stats.level.value,
            kd_ratio: stats.kd.value,
            win_rate: stats.win_rate.value,
            top_attackers: stats.top_attackers.iter().map(|o| o.name.clone()).collect(),
            top_defenders: stats.top_defenders.iter().map(|o| o.name.clone()).collect(),
        }
    }
}

/// A rendered prompt plus the output schema the response must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
    pub schema: Value,
    pub summaries: Vec<PlayerSummary>,
    pub map: String,
    pub site: String,
}

impl PromptRequest {
    pub fn player_count(&self) -> usize {
        self.summaries.len()
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no players with stats are available")]
    NoStatsAvailable,

    #[error("failed to encode player summary: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the generation request for `players` on `map`/`site`.
///
/// Fails with [`PromptError::NoStatsAvailable`] for an empty player list.
pub fn build_request(
    players: &[PlayerStats],
    map: &str,
    site: &str,
) -> Result<PromptRequest, PromptError> {
    if players.is_empty() {
        return Err(PromptError::NoStatsAvailable);
    }

    let summaries: Vec<PlayerSummary> = players.iter().map(PlayerSummary::from).collect();
    let team_json = serde_json::to_string_pretty(&summaries)?;
    let prompt = render_prompt(&team_json, summaries.len(), map, site);

    Ok(PromptRequest {
        prompt,
        schema: response_schema(),
        summaries,
        map: map.to_string(),
        site: site.to_string(),
    })
}

fn render_prompt(team_json: &str, count: usize, map: &str, site: &str) -> String {
    let (noun, entries) = if count == 1 {
        ("player", "entry")
    } else {
        ("players", "entries")
    };
    let mut prompt = String::with_capacity(2048 + team_json.len());

    prompt.push_str(&format!(
        "You are an expert Rainbow Six Siege coach. Design a coordinated attack \
         strategy for a team of exactly {count} {noun}.\n\n"
    ));

    prompt.push_str(&format!(
        "## SCENARIO\n\
         Map: {map}\n\
         Bomb site: {site}\n\n"
    ));

    prompt.push_str("## TEAM DATA\n");
    prompt.push_str(team_json);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "## ROLE ASSIGNMENT RULES\n\
         - Produce exactly {count} {entries} in playerRoles: one per player in TEAM DATA, \
         in the same order, using each username exactly as given. Never add or omit players.\n\
         - Players with a high K/D ratio (kdRatio) take aggressive entry roles: entry fragger, \
         first breach, roaming clear.\n\
         - Players whose operator pool favors support utilities (hard breachers, flash and \
         EMP utility, intel gatherers) take support roles.\n\
         - Pick each operator from the player's topAttackers when one fits the plan; \
         otherwise choose a suitable attacker and say why in the instructions.\n\
         - Every operator must be an attacker and no operator may be picked twice.\n\n"
    ));

    prompt.push_str(&format!(
        "## OUTPUT\n\
         - strategyTitle: a short, memorable name for the plan.\n\
         - map and site: exactly \"{map}\" and \"{site}\".\n\
         - strategyOverview: the core idea of the attack.\n\
         - executionSummary: a concise synopsis of 2-3 sentences.\n\
         - phases: setup (droning and preparation), execution (the hit on the site), \
         postPlant (holding the defuser).\n\
         - playerRoles: username, operator, role, and specific instructions for each player.\n\n\
         Respond only with JSON that matches the provided schema."
    ));

    prompt
}

/// The output schema sent with every generation request.
pub fn response_schema() -> Value {
    let string = json!({ "type": "STRING" });
    json!({
        "type": "OBJECT",
        "properties": {
            "strategyTitle": string,
            "map": string,
            "site": string,
            "strategyOverview": string,
            "executionSummary": string,
            "phases": {
                "type": "OBJECT",
                "properties": {
                    "setup": string,
                    "execution": string,
                    "postPlant": string
                },
                "required": ["setup", "execution", "postPlant"]
            },
            "playerRoles": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "username": string,
                        "operator": string,
                        "role": string,
                        "instructions": string
                    },
                    "required": ["username", "operator", "role", "instructions"]
                }
            }
        },
        "required": [
            "strategyTitle",
            "map",
            "site",
            "strategyOverview",
            "executionSummary",
            "phases",
            "playerRoles"
        ]
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
