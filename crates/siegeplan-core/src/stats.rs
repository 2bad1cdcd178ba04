// Player statistics: the stats provider's raw profile payload and the stable
// `PlayerStats` record normalized from it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of operators kept per role.
pub const TOP_OPERATORS: usize = 3;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Gaming platform a player account lives on. Serialized as the raw codes
/// used throughout the system (`pc`, `xbl`, `psn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "pc")]
    Pc,
    #[serde(rename = "xbl")]
    Xbox,
    #[serde(rename = "psn")]
    PlayStation,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Pc, Platform::Xbox, Platform::PlayStation];

    /// The raw platform code.
    pub fn code(self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Xbox => "xbl",
            Platform::PlayStation => "psn",
        }
    }

    /// The identifier the stats provider expects in its URL. PC accounts are
    /// Ubisoft Connect accounts on the provider side.
    pub fn provider_code(self) -> &'static str {
        match self {
            Platform::Pc => "ubi",
            other => other.code(),
        }
    }

    pub fn display_str(self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::Xbox => "Xbox",
            Platform::PlayStation => "PlayStation",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform `{0}` (expected pc, xbl or psn)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pc" => Ok(Platform::Pc),
            "xbl" | "xbox" => Ok(Platform::Xbox),
            "psn" | "playstation" => Ok(Platform::PlayStation),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// A single headline statistic with its human-readable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatDetail {
    pub value: f64,
    pub display_name: String,
}

impl StatDetail {
    fn new(value: f64, display_name: &str) -> Self {
        StatDetail {
            value,
            display_name: display_name.to_string(),
        }
    }
}

/// An operator and the number of kills the player has with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorKills {
    pub name: String,
    pub kills: u64,
}

/// Normalized statistics for one player. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Provider-confirmed identity, or the requested name when the provider
    /// did not report one.
    pub username: String,
    pub platform: Platform,
    pub level: StatDetail,
    pub kd: StatDetail,
    pub win_rate: StatDetail,
    /// At most [`TOP_OPERATORS`] entries, descending by kills.
    pub top_attackers: Vec<OperatorKills>,
    /// At most [`TOP_OPERATORS`] entries, descending by kills.
    pub top_defenders: Vec<OperatorKills>,
}

// ---------------------------------------------------------------------------
// Raw provider payload
// ---------------------------------------------------------------------------

/// Top-level profile document returned by the stats provider. Only the
/// fields the normalizer reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerProfile {
    pub data: ProfileData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(default)]
    pub platform_info: PlatformInfo,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    #[serde(default)]
    pub platform_slug: Option<String>,
    #[serde(default)]
    pub platform_user_identifier: Option<String>,
}

/// A provider sub-record, tagged by kind (`overview` or `operator`).
#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: SegmentMetadata,
    #[serde(default)]
    pub stats: HashMap<String, RawStat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStat {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub display_value: Option<String>,
}

impl Segment {
    fn stat_value(&self, key: &str) -> Option<f64> {
        self.stats.get(key).and_then(|s| s.value)
    }

    fn is_kind(&self, kind: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind)
    }
}

/// Operator role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Attacker,
    Defender,
}

impl Role {
    fn matches(self, tag: Option<&str>) -> bool {
        let expected = match self {
            Role::Attacker => "Attacker",
            Role::Defender => "Defender",
        };
        tag.is_some_and(|t| t.eq_ignore_ascii_case(expected))
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("the profile has no overview segment")]
    MissingOverview,

    #[error("malformed profile payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Build a `PlayerStats` record from a raw provider profile.
///
/// Fails with [`NormalizeError::MissingOverview`] when the payload has no
/// overview segment. Missing overview numbers default to 0. Operators are
/// kept only if they report a positive kill count, then split by role,
/// sorted by kills (ties keep provider order) and cut to the top three.
pub fn normalize(
    profile: &TrackerProfile,
    requested_username: &str,
    platform: Platform,
) -> Result<PlayerStats, NormalizeError> {
    let segments = &profile.data.segments;
    let overview = segments
        .iter()
        .find(|s| s.is_kind("overview"))
        .ok_or(NormalizeError::MissingOverview)?;

    let username = profile
        .data
        .platform_info
        .platform_user_identifier
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(requested_username)
        .to_string();

    Ok(PlayerStats {
        username,
        platform,
        level: StatDetail::new(overview.stat_value("level").unwrap_or(0.0), "Level"),
        kd: StatDetail::new(overview.stat_value("kd").unwrap_or(0.0), "K/D Ratio"),
        win_rate: StatDetail::new(
            overview.stat_value("wlPercentage").unwrap_or(0.0),
            "Win Rate",
        ),
        top_attackers: top_operators(segments, Role::Attacker),
        top_defenders: top_operators(segments, Role::Defender),
    })
}

/// Parse a raw JSON document and normalize it in one step.
pub fn normalize_json(
    raw: serde_json::Value,
    requested_username: &str,
    platform: Platform,
) -> Result<PlayerStats, NormalizeError> {
    let profile: TrackerProfile = serde_json::from_value(raw)?;
    normalize(&profile, requested_username, platform)
}

fn top_operators(segments: &[Segment], role: Role) -> Vec<OperatorKills> {
    let mut operators: Vec<OperatorKills> = segments
        .iter()
        .filter(|s| s.is_kind("operator") && role.matches(s.metadata.role.as_deref()))
        .filter_map(|s| {
            let kills = s.stat_value("kills")?.round();
            (kills >= 1.0).then(|| OperatorKills {
                name: s.metadata.name.clone(),
                kills: kills as u64,
            })
        })
        .collect();

    // `sort_by` is stable, so equal kill counts keep provider order.
    operators.sort_by(|a, b| b.kills.cmp(&a.kills));
    operators.truncate(TOP_OPERATORS);
    operators
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operator(name: &str, role: &str, kills: Option<f64>) -> serde_json::Value {
        let stats = match kills {
            Some(k) => json!({ "kills": { "value": k, "displayValue": k.to_string() } }),
            None => json!({}),
        };
        json!({
            "type": "operator",
            "attributes": { "key": name.to_lowercase() },
            "metadata": { "name": name, "role": role },
            "stats": stats
        })
    }

    fn overview(level: f64, kd: f64, wl: f64) -> serde_json::Value {
        json!({
            "type": "overview",
            "attributes": {},
            "metadata": { "name": "Lifetime Overview" },
            "stats": {
                "level": { "value": level, "displayName": "Level" },
                "kd": { "value": kd, "displayName": "K/D" },
                "wlPercentage": { "value": wl, "displayName": "Win %" }
            }
        })
    }

    fn profile(identifier: &str, segments: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "data": {
                "platformInfo": {
                    "platformSlug": "ubi",
                    "platformUserIdentifier": identifier
                },
                "userInfo": { "userId": "1", "isPremium": false },
                "segments": segments
            }
        })
    }

    #[test]
    fn platform_codes_round_trip() {
        for p in Platform::ALL {
            assert_eq!(p.code().parse::<Platform>().unwrap(), p);
            let encoded = serde_json::to_string(&p).unwrap();
            assert_eq!(encoded, format!("\"{}\"", p.code()));
        }
    }

    #[test]
    fn pc_maps_to_provider_alternate_code() {
        assert_eq!(Platform::Pc.provider_code(), "ubi");
        assert_eq!(Platform::Xbox.provider_code(), "xbl");
        assert_eq!(Platform::PlayStation.provider_code(), "psn");
    }

    #[test]
    fn platform_parse_accepts_long_names() {
        assert_eq!("Xbox".parse::<Platform>().unwrap(), Platform::Xbox);
        assert_eq!("PLAYSTATION".parse::<Platform>().unwrap(), Platform::PlayStation);
        assert!("switch".parse::<Platform>().is_err());
    }

    #[test]
    fn normalizes_overview_numbers() {
        let raw = profile("Ash99", vec![overview(120.0, 1.35, 54.2)]);
        let stats = normalize_json(raw, "ash99", Platform::Pc).unwrap();

        assert_eq!(stats.username, "Ash99");
        assert_eq!(stats.platform, Platform::Pc);
        assert_eq!(stats.level.value, 120.0);
        assert_eq!(stats.level.display_name, "Level");
        assert_eq!(stats.kd.value, 1.35);
        assert_eq!(stats.kd.display_name, "K/D Ratio");
        assert_eq!(stats.win_rate.value, 54.2);
        assert!(stats.top_attackers.is_empty());
        assert!(stats.top_defenders.is_empty());
    }

    #[test]
    fn missing_overview_fields_default_to_zero() {
        let raw = profile(
            "Ash99",
            vec![json!({ "type": "overview", "metadata": {}, "stats": { "kd": { "value": 0.9 } } })],
        );
        let stats = normalize_json(raw, "Ash99", Platform::Xbox).unwrap();
        assert_eq!(stats.level.value, 0.0);
        assert_eq!(stats.kd.value, 0.9);
        assert_eq!(stats.win_rate.value, 0.0);
    }

    #[test]
    fn missing_overview_is_a_hard_failure() {
        let raw = profile("Ash99", vec![operator("Ash", "Attacker", Some(50.0))]);
        let err = normalize_json(raw, "Ash99", Platform::Pc).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingOverview));
    }

    #[test]
    fn empty_identifier_falls_back_to_requested_name() {
        let raw = profile("", vec![overview(1.0, 1.0, 1.0)]);
        let stats = normalize_json(raw, "RequestedName", Platform::PlayStation).unwrap();
        assert_eq!(stats.username, "RequestedName");

        let raw = json!({ "data": { "segments": [overview(1.0, 1.0, 1.0)] } });
        let stats = normalize_json(raw, "NoInfo", Platform::Pc).unwrap();
        assert_eq!(stats.username, "NoInfo");
    }

    #[test]
    fn top_operators_are_partitioned_sorted_and_capped() {
        let raw = profile(
            "Ash99",
            vec![
                overview(120.0, 1.35, 50.0),
                operator("Thermite", "Attacker", Some(40.0)),
                operator("Jager", "Defender", Some(80.0)),
                operator("Ash", "Attacker", Some(50.0)),
                operator("Sledge", "Attacker", Some(10.0)),
                operator("Hibana", "Attacker", Some(45.0)),
                operator("Mute", "Defender", Some(12.0)),
            ],
        );
        let stats = normalize_json(raw, "Ash99", Platform::Pc).unwrap();

        let names: Vec<_> = stats.top_attackers.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Ash", "Hibana", "Thermite"]);
        assert_eq!(stats.top_attackers[0].kills, 50);

        let names: Vec<_> = stats.top_defenders.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Jager", "Mute"]);
    }

    #[test]
    fn zero_and_missing_kill_counts_are_excluded() {
        let raw = profile(
            "Ash99",
            vec![
                overview(1.0, 1.0, 1.0),
                operator("Ash", "Attacker", Some(0.0)),
                operator("Zofia", "Attacker", None),
                operator("Thermite", "Attacker", Some(0.4)),
                operator("Twitch", "Attacker", Some(3.0)),
            ],
        );
        let stats = normalize_json(raw, "Ash99", Platform::Pc).unwrap();
        assert_eq!(
            stats.top_attackers,
            vec![OperatorKills {
                name: "Twitch".into(),
                kills: 3
            }]
        );
    }

    #[test]
    fn ties_keep_provider_order() {
        let raw = profile(
            "Ash99",
            vec![
                overview(1.0, 1.0, 1.0),
                operator("Bandit", "Defender", Some(20.0)),
                operator("Kaid", "Defender", Some(20.0)),
                operator("Smoke", "Defender", Some(20.0)),
                operator("Valkyrie", "Defender", Some(20.0)),
            ],
        );
        let stats = normalize_json(raw, "Ash99", Platform::Pc).unwrap();
        let names: Vec<_> = stats.top_defenders.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Bandit", "Kaid", "Smoke"]);
    }

    #[test]
    fn operators_without_role_are_ignored() {
        let raw = profile(
            "Ash99",
            vec![
                overview(1.0, 1.0, 1.0),
                json!({ "type": "operator", "metadata": { "name": "Recruit" }, "stats": { "kills": { "value": 99.0 } } }),
            ],
        );
        let stats = normalize_json(raw, "Ash99", Platform::Pc).unwrap();
        assert!(stats.top_attackers.is_empty());
        assert!(stats.top_defenders.is_empty());
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = normalize_json(json!({ "errors": [] }), "x", Platform::Pc).unwrap_err();
        assert!(matches!(err, NormalizeError::Malformed(_)));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let raw = profile("Ash99", vec![overview(120.0, 1.35, 50.0)]);
        let stats = normalize_json(raw, "Ash99", Platform::Pc).unwrap();
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["winRate"]["displayName"], "Win Rate");
        assert_eq!(v["platform"], "pc");
        assert!(v["topAttackers"].is_array());
    }
}
