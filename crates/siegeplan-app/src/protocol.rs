// Messages exchanged between the front end, the session loop, and the tasks
// the session spawns.

use std::time::Duration;

use siegeplan_core::stats::Platform;
use siegeplan_core::strategy::Strategy;
use siegeplan_core::team::{FetchOutcome, Player, PlayerId};

/// Commands from the front end to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    AddPlayer { username: String, platform: Platform },
    /// Remove by (case-insensitive) username; resolved to an id in the loop.
    RemovePlayer { username: String },
    SelectMap(String),
    SelectSite(String),
    Generate,
    Show,
    Quit,
}

/// Completions reported back by spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    FetchResolved {
        id: PlayerId,
        outcome: FetchOutcome,
    },
    StrategyResolved {
        revision: u64,
        result: Result<Strategy, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Rejected user input; dismissed automatically.
    Validation,
    /// A failed operation; stays until replaced.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn validation(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Validation,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// How long roster validation notices stay visible.
pub const ROSTER_NOTICE_TTL: Duration = Duration::from_secs(3);

/// How long the "no players with stats" notice stays visible.
pub const NO_STATS_NOTICE_TTL: Duration = Duration::from_secs(4);

/// Everything the renderer needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub players: Vec<Player>,
    pub map: &'static str,
    pub site: &'static str,
    pub available_sites: &'static [&'static str],
    pub strategy: Option<Strategy>,
    pub generating: bool,
    pub notice: Option<Notice>,
}

/// Updates pushed from the session loop to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Full state, sent after roster or scenario changes and on request.
    Snapshot(Box<SessionSnapshot>),
    /// A player's stats lookup finished (loaded or failed).
    PlayerResolved(Player),
    Notice(Notice),
    NoticeCleared,
    GenerationStarted { players: usize },
    StrategyReady(Box<Strategy>),
}
