// Plain-text rendering of session updates.

use std::fmt::Write;

use siegeplan_core::scenario::MAP_CATALOG;
use siegeplan_core::strategy::Strategy;
use siegeplan_core::team::{Player, MAX_PLAYERS};

use crate::protocol::{Notice, NoticeKind, SessionSnapshot, UiUpdate};

/// Text for one update, or `None` when there is nothing to print.
pub fn render_update(update: &UiUpdate) -> Option<String> {
    match update {
        UiUpdate::Snapshot(snapshot) => Some(render_snapshot(snapshot)),
        UiUpdate::PlayerResolved(player) => Some(render_player(player)),
        UiUpdate::Notice(notice) => Some(render_notice(notice)),
        UiUpdate::NoticeCleared => None,
        UiUpdate::GenerationStarted { players } => Some(format!(
            "Generating a strategy for {players} player{}...",
            if *players == 1 { "" } else { "s" }
        )),
        UiUpdate::StrategyReady(strategy) => Some(render_strategy(strategy)),
    }
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Validation => format!("! {}", notice.message),
        NoticeKind::Error => format!("ERROR: {}", notice.message),
    }
}

pub fn render_player(player: &Player) -> String {
    let mut out = format!("{} [{}]", player.username, player.platform.display_str());
    if player.is_loading {
        out.push_str("  loading...");
    } else if let Some(error) = &player.error {
        let _ = write!(out, "  error: {error}");
    } else if let Some(stats) = &player.stats {
        let _ = write!(
            out,
            "  {} {:.0} | {} {:.2} | {} {:.1}%",
            stats.level.display_name,
            stats.level.value,
            stats.kd.display_name,
            stats.kd.value,
            stats.win_rate.display_name,
            stats.win_rate.value
        );
        if !stats.top_attackers.is_empty() {
            let ops: Vec<String> = stats
                .top_attackers
                .iter()
                .map(|o| format!("{} ({})", o.name, o.kills))
                .collect();
            let _ = write!(out, "\n    Attack:  {}", ops.join(", "));
        }
        if !stats.top_defenders.is_empty() {
            let ops: Vec<String> = stats
                .top_defenders
                .iter()
                .map(|o| format!("{} ({})", o.name, o.kills))
                .collect();
            let _ = write!(out, "\n    Defense: {}", ops.join(", "));
        }
    }
    out
}

pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Map: {}  Site: {}", snapshot.map, snapshot.site);
    let _ = writeln!(out, "Sites: {}", snapshot.available_sites.join(", "));
    let _ = writeln!(out, "Team ({}/{}):", snapshot.players.len(), MAX_PLAYERS);
    if snapshot.players.is_empty() {
        out.push_str("  (no players yet)\n");
    }
    for player in &snapshot.players {
        for line in render_player(player).lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    if let Some(notice) = &snapshot.notice {
        let _ = writeln!(out, "{}", render_notice(notice));
    }
    if snapshot.generating {
        out.push_str("Generating a strategy...\n");
    } else if let Some(strategy) = &snapshot.strategy {
        out.push_str(&render_strategy(strategy));
    }
    out.trim_end().to_string()
}

pub fn render_strategy(strategy: &Strategy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", strategy.strategy_title);
    let _ = writeln!(out, "{} / {}", strategy.map, strategy.site);
    let _ = writeln!(out, "\n{}", strategy.strategy_overview);
    let _ = writeln!(out, "\nSummary: {}", strategy.execution_summary);
    let _ = writeln!(out, "\nSetup:      {}", strategy.phases.setup);
    let _ = writeln!(out, "Execution:  {}", strategy.phases.execution);
    let _ = writeln!(out, "Post-plant: {}", strategy.phases.post_plant);
    out.push_str("\nRoles:\n");
    for role in &strategy.player_roles {
        let _ = writeln!(
            out,
            "  {} - {} ({}): {}",
            role.username, role.operator, role.role, role.instructions
        );
    }
    out.trim_end().to_string()
}

pub fn render_catalog() -> String {
    MAP_CATALOG
        .iter()
        .map(|m| format!("{}: {}", m.name, m.sites.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeplan_core::stats::{OperatorKills, Platform, PlayerStats, StatDetail};
    use siegeplan_core::strategy::{Phases, PlayerRole};
    use siegeplan_core::team::PlayerId;

    fn player(stats: bool, error: Option<&str>) -> Player {
        Player {
            id: PlayerId::new(),
            username: "Ash99".into(),
            platform: Platform::Pc,
            stats: stats.then(|| PlayerStats {
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
                    value: 54.2,
                    display_name: "Win Rate".into(),
                },
                top_attackers: vec![OperatorKills {
                    name: "Ash".into(),
                    kills: 50,
                }],
                top_defenders: vec![],
            }),
            is_loading: !stats && error.is_none(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn player_lines() {
        assert_eq!(render_player(&player(false, None)), "Ash99 [PC]  loading...");
        assert_eq!(
            render_player(&player(false, Some("Player 'Ash99' not found on PC"))),
            "Ash99 [PC]  error: Player 'Ash99' not found on PC"
        );
        let loaded = render_player(&player(true, None));
        assert!(loaded.starts_with("Ash99 [PC]  Level 120 | K/D Ratio 1.35 | Win Rate 54.2%"));
        assert!(loaded.contains("Attack:  Ash (50)"));
        assert!(!loaded.contains("Defense"));
    }

    #[test]
    fn strategy_lists_roles() {
        let strategy = Strategy {
            strategy_title: "Garage Rush".into(),
            map: "Club House".into(),
            site: "Contanti/CCTV".into(),
            strategy_overview: "Hit fast.".into(),
            execution_summary: "Drone. Breach.".into(),
            phases: Phases {
                setup: "a".into(),
                execution: "b".into(),
                post_plant: "c".into(),
            },
            player_roles: vec![PlayerRole {
                username: "Ash99".into(),
                operator: "Ash".into(),
                role: "Entry".into(),
                instructions: "Open the wall.".into(),
            }],
        };
        let text = render_strategy(&strategy);
        assert!(text.starts_with("=== Garage Rush ==="));
        assert!(text.contains("Club House / Contanti/CCTV"));
        assert!(text.contains("Post-plant: c"));
        assert!(text.ends_with("Ash99 - Ash (Entry): Open the wall."));
    }

    #[test]
    fn snapshot_shows_scenario_and_empty_roster() {
        let snapshot = SessionSnapshot {
            players: vec![],
            map: "Oregon",
            site: "Cucina/Sala da pranzo",
            available_sites: MAP_CATALOG[0].sites,
            strategy: None,
            generating: false,
            notice: Some(Notice::validation("Enter a username")),
        };
        let text = render_snapshot(&snapshot);
        assert!(text.starts_with("Map: Oregon  Site: Cucina/Sala da pranzo"));
        assert!(text.contains("Team (0/5):"));
        assert!(text.contains("(no players yet)"));
        assert!(text.ends_with("! Enter a username"));
    }

    #[test]
    fn cleared_notice_prints_nothing() {
        assert_eq!(render_update(&UiUpdate::NoticeCleared), None);
        assert_eq!(
            render_update(&UiUpdate::GenerationStarted { players: 1 }).as_deref(),
            Some("Generating a strategy for 1 player...")
        );
    }

    #[test]
    fn catalog_lists_every_map_in_order() {
        let text = render_catalog();
        let names: Vec<&str> = text.lines().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(
            names,
            ["Oregon", "Club House", "Kafe Dostoyevsky", "Banca", "Consolato", "Chalet"]
        );
    }
}
