// Generated attack strategy as returned by the generative service.

use serde::{Deserialize, Serialize};

/// A complete attack plan for one map/site and the current roster.
///
/// Strategies are ephemeral: each generation produces a fresh value and a
/// previous one is never merged into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub strategy_title: String,
    pub map: String,
    pub site: String,
    pub strategy_overview: String,
    /// Two or three sentence synopsis of the execution.
    pub execution_summary: String,
    pub phases: Phases,
    /// One entry per player that had stats, in roster order.
    pub player_roles: Vec<PlayerRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phases {
    pub setup: String,
    pub execution: String,
    pub post_plant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRole {
    pub username: String,
    pub operator: String,
    pub role: String,
    pub instructions: String,
}
