// Planning state: the roster, the selected scenario, and the strategy
// generated for them.
//
// Every roster or scenario mutation clears the current strategy and bumps a
// revision counter. Generation results carry the revision they were requested
// at, and results for an outdated revision are discarded.

use thiserror::Error;
use tracing::{debug, info};

use crate::scenario::{Scenario, ScenarioError};
use crate::stats::Platform;
use crate::strategy::Strategy;
use crate::team::{FetchOutcome, Player, PlayerId, Resolution, Team, TeamError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Add at least one player with valid stats to generate a strategy")]
    NoLoadedPlayers,
}

/// Snapshot of everything a generation request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub revision: u64,
    /// Players with loaded stats, in roster order.
    pub players: Vec<Player>,
    pub map: String,
    pub site: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlanState {
    team: Team,
    scenario: Scenario,
    strategy: Option<Strategy>,
    revision: u64,
}

impl PlanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn strategy(&self) -> Option<&Strategy> {
        self.strategy.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        if self.strategy.take().is_some() {
            debug!("Cleared strategy (revision {})", self.revision);
        }
    }

    pub fn add_player(&mut self, username: &str, platform: Platform) -> Result<PlayerId, TeamError> {
        let id = self.team.add_player(username, platform)?;
        info!("Added player {} ({}) as {}", username.trim(), platform, id);
        self.invalidate();
        Ok(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.team.remove_player(id);
        if let Some(p) = &removed {
            info!("Removed player {}", p.username);
        }
        self.invalidate();
        removed
    }

    pub fn resolve(&mut self, id: PlayerId, outcome: FetchOutcome) -> Resolution {
        self.team.resolve(id, outcome)
    }

    pub fn select_map(&mut self, map: &str) -> Result<(), ScenarioError> {
        self.scenario.select_map(map)?;
        self.invalidate();
        Ok(())
    }

    pub fn select_site(&mut self, site: &str) -> Result<(), ScenarioError> {
        self.scenario.select_site(site)?;
        self.invalidate();
        Ok(())
    }

    /// Start a generation attempt: clears any shown strategy and snapshots the
    /// loaded players and scenario under a fresh revision.
    pub fn begin_generation(&mut self) -> Result<GenerationRequest, PlanError> {
        if !self.team.has_loaded_stats() {
            return Err(PlanError::NoLoadedPlayers);
        }
        self.invalidate();

        Ok(GenerationRequest {
            revision: self.revision,
            players: self
                .team
                .players()
                .iter()
                .filter(|p| p.stats.is_some())
                .cloned()
                .collect(),
            map: self.scenario.map().to_string(),
            site: self.scenario.site().to_string(),
        })
    }

    /// Store a generated strategy if it was requested at the current revision.
    /// Returns `false` when the result is stale.
    pub fn complete_generation(&mut self, revision: u64, strategy: Strategy) -> bool {
        if revision != self.revision {
            debug!(
                "Discarding stale strategy (revision {}, current {})",
                revision, self.revision
            );
            return false;
        }
        self.strategy = Some(strategy);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{OperatorKills, PlayerStats, StatDetail};
    use crate::strategy::Phases;

    fn ash_stats() -> PlayerStats {
        PlayerStats {
            username: "Ash99".into(),
            platform: Platform::Pc,
            level: StatDetail {
                value: 120.0,
                display_name: "Level".into(),
            },
            kd: StatDetail {
                value: 1.35,
                display_name: "K/D Ratio".into(),
            },
            win_rate: StatDetail {
                value: 52.0,
                display_name: "Win Rate".into(),
            },
            top_attackers: vec![OperatorKills {
                name: "Ash".into(),
                kills: 50,
            }],
            top_defenders: vec![],
        }
    }

    fn strategy(map: &str, site: &str) -> Strategy {
        Strategy {
            strategy_title: "Test".into(),
            map: map.into(),
            site: site.into(),
            strategy_overview: "o".into(),
            execution_summary: "e".into(),
            phases: Phases {
                setup: "s".into(),
                execution: "x".into(),
                post_plant: "p".into(),
            },
            player_roles: vec![],
        }
    }

    fn with_generated_strategy() -> (PlanState, PlayerId) {
        let mut plan = PlanState::new();
        let id = plan.add_player("Ash99", Platform::Pc).unwrap();
        plan.resolve(id, Ok(ash_stats()));
        let req = plan.begin_generation().unwrap();
        assert!(plan.complete_generation(req.revision, strategy(&req.map, &req.site)));
        assert!(plan.strategy().is_some());
        (plan, id)
    }

    #[test]
    fn generation_requires_loaded_players() {
        let mut plan = PlanState::new();
        assert_eq!(plan.begin_generation(), Err(PlanError::NoLoadedPlayers));

        let id = plan.add_player("Ash99", Platform::Pc).unwrap();
        assert_eq!(plan.begin_generation(), Err(PlanError::NoLoadedPlayers));

        plan.resolve(id, Err("Player not found".into()));
        assert_eq!(plan.begin_generation(), Err(PlanError::NoLoadedPlayers));
    }

    #[test]
    fn generation_request_snapshots_loaded_players_in_order() {
        let mut plan = PlanState::new();
        let a = plan.add_player("Ash99", Platform::Pc).unwrap();
        let b = plan.add_player("Ghost", Platform::Xbox).unwrap();
        let c = plan.add_player("Mira", Platform::PlayStation).unwrap();
        plan.resolve(c, Ok(ash_stats()));
        plan.resolve(b, Err("nope".into()));
        plan.resolve(a, Ok(ash_stats()));
        plan.select_map("Chalet").unwrap();

        let req = plan.begin_generation().unwrap();
        let names: Vec<_> = req.players.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["Ash99", "Mira"]);
        assert_eq!(req.map, "Chalet");
        assert_eq!(req.site, "Cantina/Cantina vini");
    }

    #[test]
    fn roster_mutations_clear_strategy() {
        let (mut plan, id) = with_generated_strategy();
        plan.add_player("Ghost", Platform::Xbox).unwrap();
        assert!(plan.strategy().is_none());

        let (mut plan, _) = with_generated_strategy();
        plan.remove_player(id);
        assert!(plan.strategy().is_none());
    }

    #[test]
    fn rejected_add_keeps_strategy() {
        let (mut plan, _) = with_generated_strategy();
        assert!(plan.add_player("ASH99", Platform::Xbox).is_err());
        assert!(plan.strategy().is_some());
    }

    #[test]
    fn scenario_changes_clear_strategy() {
        let (mut plan, _) = with_generated_strategy();
        plan.select_map("Club House").unwrap();
        assert_eq!(plan.scenario().site(), "Contanti/CCTV");
        assert!(plan.strategy().is_none());

        let (mut plan, _) = with_generated_strategy();
        plan.select_site("Torre/Archivi").unwrap();
        assert!(plan.strategy().is_none());
    }

    #[test]
    fn invalid_scenario_change_keeps_strategy() {
        let (mut plan, _) = with_generated_strategy();
        assert!(plan.select_map("Nowhere").is_err());
        assert!(plan.strategy().is_some());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut plan = PlanState::new();
        let id = plan.add_player("Ash99", Platform::Pc).unwrap();
        plan.resolve(id, Ok(ash_stats()));
        let req = plan.begin_generation().unwrap();

        plan.select_map("Banca").unwrap();
        assert!(!plan.complete_generation(req.revision, strategy(&req.map, &req.site)));
        assert!(plan.strategy().is_none());
    }

    #[test]
    fn beginning_generation_clears_previous_strategy() {
        let (mut plan, _) = with_generated_strategy();
        plan.begin_generation().unwrap();
        assert!(plan.strategy().is_none());
    }

    #[test]
    fn walkthrough_duplicate_map_and_removal() {
        let mut plan = PlanState::new();
        let ash = plan.add_player("Ash99", Platform::Pc).unwrap();
        plan.resolve(ash, Ok(ash_stats()));

        let stats = plan.team().get(ash).unwrap().stats.clone().unwrap();
        assert_eq!(stats.kd.value, 1.35);
        assert_eq!(stats.level.value, 120.0);
        assert_eq!(stats.top_attackers[0].name, "Ash");

        assert!(matches!(
            plan.add_player("ash99", Platform::Xbox),
            Err(TeamError::Duplicate(_))
        ));
        assert_eq!(plan.team().len(), 1);

        plan.select_map("Club House").unwrap();
        assert_eq!(plan.scenario().site(), "Contanti/CCTV");

        plan.remove_player(ash);
        assert!(plan.team().is_empty());
        assert!(plan.strategy().is_none());
    }
}
