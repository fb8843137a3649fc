use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::canonical_team;
use crate::types::{CandidatePick, GameEnvironment, H2hRecord};

/// Self-contained engine input: one slate date, one preset name, the
/// candidate pool, and the three context maps flattened to plain keys.
/// This is the document golden-snapshot tests replay, so it must survive
/// a JSON round-trip losslessly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateSnapshot {
    pub date: NaiveDate,
    pub preset: String,
    #[serde(default)]
    pub candidates: Vec<CandidatePick>,
    /// Keyed by `h2h_key` (player|opponent|stat).
    #[serde(default)]
    pub h2h: HashMap<String, H2hRecord>,
    /// Keyed by canonical team abbreviation.
    #[serde(default)]
    pub environments: HashMap<String, GameEnvironment>,
    /// Keyed by `defense_key` (team|stat); 1 = strongest defense.
    #[serde(default)]
    pub defense_ranks: HashMap<String, u32>,
}

pub fn h2h_key(player: &str, opponent: &str, stat: &str) -> String {
    format!(
        "{}|{}|{}",
        player.trim().to_lowercase(),
        canonical_team(opponent).to_lowercase(),
        stat.trim().to_lowercase()
    )
}

pub fn defense_key(team: &str, stat: &str) -> String {
    format!("{}|{}", canonical_team(team), stat.trim().to_lowercase())
}

pub fn env_key(team: &str) -> String {
    canonical_team(team)
}

impl SlateSnapshot {
    pub fn environment(&self, team: &str) -> Option<&GameEnvironment> {
        self.environments.get(&env_key(team))
    }

    pub fn head_to_head(&self, player: &str, opponent: &str, stat: &str) -> Option<&H2hRecord> {
        self.h2h.get(&h2h_key(player, opponent, stat))
    }

    pub fn defense_rank(&self, team: &str, stat: &str) -> Option<u32> {
        self.defense_ranks.get(&defense_key(team, stat)).copied()
    }
}

pub fn load_snapshot(path: &Path) -> Result<SlateSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read slate snapshot {}", path.display()))?;
    parse_snapshot(&raw)
}

pub fn parse_snapshot(raw: &str) -> Result<SlateSnapshot> {
    serde_json::from_str::<SlateSnapshot>(raw).context("parse slate snapshot")
}

pub fn save_snapshot(path: &Path, snapshot: &SlateSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(snapshot).context("serialize slate snapshot")?;
    fs::write(&tmp, json).context("write slate snapshot")?;
    fs::rename(&tmp, path).context("swap slate snapshot")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn keys_normalize_case_and_team_aliases() {
        assert_eq!(h2h_key("J. Doe ", "New York Knicks", "Points"), "j. doe|nyk|points");
        assert_eq!(defense_key("knicks", "REBOUNDS"), "NYK|rebounds");
        assert_eq!(env_key("Boston Celtics"), "BOS");
    }

    #[test]
    fn sparse_document_parses_with_defaults() {
        let raw = r#"{"date":"2026-03-14","preset":"balanced"}"#;
        let snap = parse_snapshot(raw).unwrap();
        assert!(snap.candidates.is_empty());
        assert!(snap.h2h.is_empty());
        assert!(snap.environments.is_empty());
        assert!(snap.defense_ranks.is_empty());
    }

    #[test]
    fn candidate_with_missing_optionals_parses() {
        let raw = r#"{
            "date": "2026-03-14",
            "preset": "sharp",
            "candidates": [
                {"player": "J. Doe", "team": "BOS", "stat": "points", "side": "over"}
            ]
        }"#;
        let snap = parse_snapshot(raw).unwrap();
        let pick = &snap.candidates[0];
        assert_eq!(pick.side, Side::Over);
        assert_eq!(pick.line, 0.0);
        assert!(pick.category.is_none());
        assert!(pick.trailing_hit_rate.is_none());
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let raw = r#"{
            "date": "2026-03-14",
            "preset": "balanced",
            "candidates": [
                {"player": "J. Doe", "team": "BOS", "stat": "points", "line": 22.5,
                 "side": "over", "confidence": 0.81, "archetype": "rim_runner",
                 "category": "volume_scorer_points_over", "trailing_hit_rate": 0.64,
                 "sample_size": 18, "injury_status": "probable"}
            ],
            "h2h": {"j. doe|nyk|points": {"games": 5, "avg_value": 24.2,
                "hit_rate_over": 0.6, "hit_rate_under": 0.4,
                "min_value": 11.0, "max_value": 38.0}},
            "environments": {"BOS": {"total": 224.5, "pace": "fast",
                "script": "competitive", "grind_factor": 0.35, "opponent": "NYK"}},
            "defense_ranks": {"NYK|points": 7}
        }"#;
        let snap = parse_snapshot(raw).unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        let again = parse_snapshot(&json).unwrap();
        let a = serde_json::to_value(&snap).unwrap();
        let b = serde_json::to_value(&again).unwrap();
        assert_eq!(a, b);
        assert_eq!(again.defense_rank("NYK", "points"), Some(7));
        assert!(again.head_to_head("J. Doe", "NYK", "points").is_some());
        assert!(again.environment("Boston Celtics").is_some());
    }
}
