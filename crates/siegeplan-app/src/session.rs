// Session orchestration.
//
// The session owns the planning state and is driven by a single event loop
// that selects over user commands, completions from spawned lookup and
// generation tasks, and a periodic notice-expiry tick. Every state change is
// pushed to the renderer as a `UiUpdate`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use siegeplan_core::plan::PlanState;
use siegeplan_core::stats::Platform;
use siegeplan_core::team::{PlayerId, Resolution};

use crate::protocol::{
    AppEvent, Notice, SessionSnapshot, UiUpdate, UserCommand, NO_STATS_NOTICE_TTL,
    ROSTER_NOTICE_TTL,
};
use crate::proxy::{StatsSource, StrategySource};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How often the loop checks whether the current notice has expired.
pub const NOTICE_CHECK_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct ActiveNotice {
    notice: Notice,
    /// `None` for notices that stay until replaced.
    expires_at: Option<Instant>,
}

pub struct Session {
    plan: PlanState,
    notice: Option<ActiveNotice>,
    /// A generation request is outstanding. At most one at a time.
    generating: bool,
    stats: Arc<dyn StatsSource>,
    strategies: Arc<dyn StrategySource>,
    /// Spawned tasks report their completions through clones of this sender.
    event_tx: mpsc::Sender<AppEvent>,
}

impl Session {
    pub fn new(
        stats: Arc<dyn StatsSource>,
        strategies: Arc<dyn StrategySource>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Session {
            plan: PlanState::new(),
            notice: None,
            generating: false,
            stats,
            strategies,
            event_tx,
        }
    }

    pub fn plan(&self) -> &PlanState {
        &self.plan
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().map(|n| &n.notice)
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let scenario = self.plan.scenario();
        SessionSnapshot {
            players: self.plan.team().players().to_vec(),
            map: scenario.map(),
            site: scenario.site(),
            available_sites: scenario.available_sites(),
            strategy: self.plan.strategy().cloned(),
            generating: self.generating,
            notice: self.notice().cloned(),
        }
    }

    fn snapshot_update(&self) -> UiUpdate {
        UiUpdate::Snapshot(Box::new(self.snapshot()))
    }

    /// Show `notice`, replacing any current one.
    fn set_notice(&mut self, notice: Notice, ttl: Option<Duration>) -> UiUpdate {
        debug!(message = %notice.message, "Notice");
        self.notice = Some(ActiveNotice {
            notice: notice.clone(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        });
        UiUpdate::Notice(notice)
    }

    fn clear_notice(&mut self) -> Option<UiUpdate> {
        self.notice.take().map(|_| UiUpdate::NoticeCleared)
    }

    /// Drop the current notice if it has expired by `now`.
    pub fn expire_notice(&mut self, now: Instant) -> Option<UiUpdate> {
        let expired = self
            .notice
            .as_ref()
            .and_then(|n| n.expires_at)
            .is_some_and(|at| now >= at);
        if expired {
            self.clear_notice()
        } else {
            None
        }
    }

    // --- Commands ---

    /// Apply a user command. `Quit` is handled by the loop and ignored here.
    pub fn handle_command(&mut self, cmd: UserCommand) -> Vec<UiUpdate> {
        match cmd {
            UserCommand::AddPlayer { username, platform } => self.add_player(&username, platform),
            UserCommand::RemovePlayer { username } => self.remove_player(&username),
            UserCommand::SelectMap(map) => self.select_map(&map),
            UserCommand::SelectSite(site) => self.select_site(&site),
            UserCommand::Generate => self.generate(),
            UserCommand::Show => vec![self.snapshot_update()],
            UserCommand::Quit => vec![],
        }
    }

    fn add_player(&mut self, username: &str, platform: Platform) -> Vec<UiUpdate> {
        let id = match self.plan.add_player(username, platform) {
            Ok(id) => id,
            Err(e) => {
                info!(username, %e, "Rejected player");
                return vec![self.set_notice(Notice::validation(e.to_string()), Some(ROSTER_NOTICE_TTL))];
            }
        };

        if let Some(player) = self.plan.team().get(id) {
            self.spawn_fetch(id, player.username.clone(), platform);
        }
        vec![self.snapshot_update()]
    }

    fn remove_player(&mut self, username: &str) -> Vec<UiUpdate> {
        let Some(id) = self.plan.team().find_by_username(username).map(|p| p.id) else {
            return vec![self.set_notice(
                Notice::validation(format!("No player named \"{}\" on the team", username.trim())),
                Some(ROSTER_NOTICE_TTL),
            )];
        };
        self.plan.remove_player(id);
        vec![self.snapshot_update()]
    }

    fn select_map(&mut self, map: &str) -> Vec<UiUpdate> {
        match self.plan.select_map(map) {
            Ok(()) => {
                info!(map = self.plan.scenario().map(), site = self.plan.scenario().site(), "Map selected");
                vec![self.snapshot_update()]
            }
            Err(e) => vec![self.set_notice(Notice::validation(e.to_string()), Some(ROSTER_NOTICE_TTL))],
        }
    }

    fn select_site(&mut self, site: &str) -> Vec<UiUpdate> {
        match self.plan.select_site(site) {
            Ok(()) => {
                info!(site = self.plan.scenario().site(), "Site selected");
                vec![self.snapshot_update()]
            }
            Err(e) => vec![self.set_notice(Notice::validation(e.to_string()), Some(ROSTER_NOTICE_TTL))],
        }
    }

    fn generate(&mut self) -> Vec<UiUpdate> {
        if self.generating {
            return vec![self.set_notice(
                Notice::validation("A strategy is already being generated"),
                Some(ROSTER_NOTICE_TTL),
            )];
        }

        let request = match self.plan.begin_generation() {
            Ok(request) => request,
            Err(e) => {
                return vec![self.set_notice(Notice::validation(e.to_string()), Some(NO_STATS_NOTICE_TTL))];
            }
        };

        self.generating = true;
        let players = request.players.len();
        info!(
            players,
            map = %request.map,
            site = %request.site,
            revision = request.revision,
            "Requesting strategy"
        );

        let source = Arc::clone(&self.strategies);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = source
                .generate_strategy(&request.players, &request.map, &request.site)
                .await
                .map_err(|e| {
                    warn!(%e, "Strategy request failed");
                    e.to_string()
                });
            let _ = tx
                .send(AppEvent::StrategyResolved {
                    revision: request.revision,
                    result,
                })
                .await;
        });

        let mut updates: Vec<UiUpdate> = self.clear_notice().into_iter().collect();
        updates.push(UiUpdate::GenerationStarted { players });
        updates
    }

    fn spawn_fetch(&self, id: PlayerId, username: String, platform: Platform) {
        let source = Arc::clone(&self.stats);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = source.fetch_stats(&username, platform).await.map_err(|e| {
                warn!(%username, %platform, %e, "Stats lookup failed");
                e.to_string()
            });
            let _ = tx.send(AppEvent::FetchResolved { id, outcome }).await;
        });
    }

    // --- Completions ---

    pub fn handle_event(&mut self, event: AppEvent) -> Vec<UiUpdate> {
        match event {
            AppEvent::FetchResolved { id, outcome } => match self.plan.resolve(id, outcome) {
                Resolution::Ignored => vec![],
                Resolution::Loaded | Resolution::Failed => self
                    .plan
                    .team()
                    .get(id)
                    .cloned()
                    .map(UiUpdate::PlayerResolved)
                    .into_iter()
                    .collect(),
            },
            AppEvent::StrategyResolved { revision, result } => {
                self.generating = false;
                if revision != self.plan.revision() {
                    info!(
                        revision,
                        current = self.plan.revision(),
                        "Discarding strategy result for an outdated roster or scenario"
                    );
                    return vec![];
                }
                match result {
                    Ok(strategy) => {
                        info!(title = %strategy.strategy_title, "Strategy ready");
                        self.plan.complete_generation(revision, strategy.clone());
                        vec![UiUpdate::StrategyReady(Box::new(strategy))]
                    }
                    Err(message) => vec![self.set_notice(
                        Notice::error(format!("Strategy generation failed: {message}")),
                        None,
                    )],
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the session event loop.
///
/// Listens on two channels and a timer using `tokio::select!`:
/// 1. User commands from the front end
/// 2. Completions from spawned lookup and generation tasks
/// 3. The notice-expiry tick
///
/// Returns when `Quit` arrives or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut event_rx: mpsc::Receiver<AppEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut session: Session,
) -> anyhow::Result<()> {
    info!("Session event loop started");

    let mut events_open = true;
    let mut notice_interval = tokio::time::interval(NOTICE_CHECK_INTERVAL);
    notice_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    notice_interval.tick().await;

    loop {
        let updates = tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(UserCommand::Quit) => {
                    info!("Quit command received, shutting down");
                    break;
                }
                Some(cmd) => session.handle_command(cmd),
                None => {
                    info!("Command channel closed, shutting down");
                    break;
                }
            },

            event = event_rx.recv(), if events_open => match event {
                Some(event) => session.handle_event(event),
                None => {
                    events_open = false;
                    vec![]
                }
            },

            _ = notice_interval.tick() => session.expire_notice(Instant::now()).into_iter().collect(),
        };

        for update in updates {
            let _ = ui_tx.send(update).await;
        }
    }

    info!("Session event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
