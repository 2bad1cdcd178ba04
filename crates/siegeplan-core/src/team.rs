// Team roster: up to five players, each with an independent fetch lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::stats::{Platform, PlayerStats};

/// Maximum roster size.
pub const MAX_PLAYERS: usize = 5;

/// Stable identifier for a roster slot, assigned when the player is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        PlayerId(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One roster slot.
///
/// Created pending (`is_loading`), then resolved exactly once to either
/// `stats` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub platform: Platform,
    #[serde(default)]
    pub stats: Option<PlayerStats>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Player {
    fn pending(username: String, platform: Platform) -> Self {
        Player {
            id: PlayerId::new(),
            username,
            platform,
            stats: None,
            is_loading: true,
            error: None,
        }
    }
}

/// Result of a stats lookup for one player.
pub type FetchOutcome = Result<PlayerStats, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    #[error("Enter a username")]
    EmptyUsername,

    #[error("Player \"{0}\" is already on the team")]
    Duplicate(String),

    #[error("The team is full ({} players)", MAX_PLAYERS)]
    Full,
}

/// What `resolve` did with a fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Loaded,
    Failed,
    /// The player was removed, or already resolved; nothing changed.
    Ignored,
}

/// Ordered roster. Players are addressed by [`PlayerId`], never by position.
#[derive(Debug, Clone, Default)]
pub struct Team {
    players: Vec<Player>,
}

impl Team {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Case-insensitive username lookup.
    pub fn find_by_username(&self, username: &str) -> Option<&Player> {
        let wanted = username.trim().to_lowercase();
        self.players
            .iter()
            .find(|p| p.username.to_lowercase() == wanted)
    }

    /// Append a pending player. The username is trimmed before validation.
    ///
    /// Rejects empty names, case-insensitive duplicates, and a sixth player.
    /// The roster is untouched on error.
    pub fn add_player(&mut self, username: &str, platform: Platform) -> Result<PlayerId, TeamError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TeamError::EmptyUsername);
        }
        if self.find_by_username(username).is_some() {
            return Err(TeamError::Duplicate(username.to_string()));
        }
        if self.is_full() {
            return Err(TeamError::Full);
        }

        let player = Player::pending(username.to_string(), platform);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Remove the player with `id`, if present.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    /// Apply a fetch outcome to a pending player.
    ///
    /// A no-op when the player has since been removed or has already been
    /// resolved, so late or duplicate completions cannot corrupt the roster.
    pub fn resolve(&mut self, id: PlayerId, outcome: FetchOutcome) -> Resolution {
        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            debug!("Discarding fetch result for removed player {}", id);
            return Resolution::Ignored;
        };
        if !player.is_loading {
            debug!("Discarding duplicate fetch result for {}", player.username);
            return Resolution::Ignored;
        }

        player.is_loading = false;
        match outcome {
            Ok(stats) => {
                player.stats = Some(stats);
                Resolution::Loaded
            }
            Err(message) => {
                player.error = Some(message);
                Resolution::Failed
            }
        }
    }

    /// Players whose stats have loaded, in roster order.
    pub fn loaded_stats(&self) -> Vec<PlayerStats> {
        self.players.iter().filter_map(|p| p.stats.clone()).collect()
    }

    pub fn has_loaded_stats(&self) -> bool {
        self.players.iter().any(|p| p.stats.is_some())
    }

    pub fn pending_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_loading).count()
    }
}
