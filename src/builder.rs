use std::collections::{HashMap, HashSet};

use crate::filters;
use crate::normalize;
use crate::rules::{FORMULA_SLOTS, MAX_PER_TEAM, TARGET_LEG_COUNT};
use crate::scoring::{self, WeightPreset};
use crate::snapshot::SlateSnapshot;
use crate::types::{
    BuilderOutput, Diagnostics, LegStatus, ScoreBreakdown, SelectedLeg, StageOutcome, TraceRow,
};

struct Validated {
    idx: usize,
    canon_team: String,
    pattern_score: f64,
    breakdown: ScoreBreakdown,
    defense_rank: Option<u32>,
}

/// Run the full pipeline with the preset named by the snapshot. Unknown
/// preset names fall back to balanced rather than failing the slate.
pub fn build_slate(snapshot: &SlateSnapshot) -> BuilderOutput {
    let preset = match scoring::preset_by_name(&snapshot.preset) {
        Some(p) => p,
        None => {
            log::warn!(
                "unknown preset {:?}, falling back to {}",
                snapshot.preset,
                scoring::BALANCED.name
            );
            &scoring::BALANCED
        }
    };
    build_slate_with_preset(snapshot, preset)
}

/// Filter, score, and assemble the slate. Pure over its inputs: the same
/// snapshot and preset always produce the same output, byte for byte.
pub fn build_slate_with_preset(snapshot: &SlateSnapshot, preset: &WeightPreset) -> BuilderOutput {
    let mut diagnostics = Diagnostics {
        total_candidates: snapshot.candidates.len(),
        ..Diagnostics::default()
    };
    let mut trace: Vec<TraceRow> = Vec::with_capacity(snapshot.candidates.len());
    let mut validated: Vec<Validated> = Vec::new();

    for (idx, pick) in snapshot.candidates.iter().enumerate() {
        let mut row = TraceRow {
            player: pick.player.clone(),
            team: pick.team.clone(),
            stat: pick.stat.clone(),
            line: pick.line,
            side: pick.side,
            category: pick.category.clone(),
            sanity: StageOutcome::Skipped,
            archetype: StageOutcome::Skipped,
            head_to_head: StageOutcome::Skipped,
            pattern: StageOutcome::Skipped,
            pattern_score: 0.0,
            pattern_reason: String::new(),
            breakdown: None,
            status: LegStatus::Rejected { reason: String::new() },
        };

        if let Some(reason) = filters::sanity_reason(pick) {
            row.sanity = StageOutcome::Rejected;
            row.status = LegStatus::Rejected { reason };
            diagnostics.rejected_sanity += 1;
            trace.push(row);
            continue;
        }
        row.sanity = StageOutcome::Passed;

        if let Some(reason) = filters::archetype_reason(pick) {
            row.archetype = StageOutcome::Rejected;
            row.status = LegStatus::Rejected { reason };
            diagnostics.rejected_archetype += 1;
            trace.push(row);
            continue;
        }
        row.archetype = StageOutcome::Passed;

        let canon_team = normalize::canonical_team(&pick.team);
        let env = snapshot.environment(&canon_team);
        let opponent = env.map(|e| normalize::canonical_team(&e.opponent));
        let h2h = opponent
            .as_deref()
            .and_then(|opp| snapshot.head_to_head(&pick.player, opp, &pick.stat));
        let defense_rank = opponent
            .as_deref()
            .and_then(|opp| snapshot.defense_rank(opp, &pick.stat));

        if let Some(reason) = filters::head_to_head_reason(pick, h2h) {
            row.head_to_head = StageOutcome::Rejected;
            row.status = LegStatus::Rejected { reason };
            diagnostics.rejected_head_to_head += 1;
            trace.push(row);
            continue;
        }
        row.head_to_head = StageOutcome::Passed;

        let outcome = filters::validate_pattern(pick, env, defense_rank);
        row.pattern_score = outcome.score;
        row.pattern_reason = outcome.reason.clone();
        if !outcome.pass {
            row.pattern = StageOutcome::Rejected;
            row.status = LegStatus::Rejected { reason: outcome.reason };
            diagnostics.rejected_pattern += 1;
            trace.push(row);
            continue;
        }
        row.pattern = StageOutcome::Passed;

        let breakdown = scoring::score_candidate(pick, outcome.score, preset);
        row.breakdown = Some(breakdown);
        row.status = LegStatus::Rejected { reason: "not selected".to_string() };
        trace.push(row);

        diagnostics.validated += 1;
        validated.push(Validated {
            idx,
            canon_team,
            pattern_score: outcome.score,
            breakdown,
            defense_rank,
        });
    }

    // Greedy formula fill, then a score-ordered fallback over everything
    // that validated. Ties break on input order, so replays are stable.
    let mut used_players: HashSet<String> = HashSet::new();
    let mut team_counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<usize> = HashSet::new();
    let mut legs: Vec<SelectedLeg> = Vec::new();

    for slot in FORMULA_SLOTS {
        if legs.len() >= TARGET_LEG_COUNT {
            break;
        }
        let mut pool: Vec<&Validated> = validated
            .iter()
            .filter(|v| !taken.contains(&v.idx))
            .filter(|v| {
                let pick = &snapshot.candidates[v.idx];
                pick.side == slot.side
                    && pick
                        .category
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(slot.category))
            })
            .collect();
        sort_by_score(&mut pool);

        let mut filled = 0usize;
        for v in pool {
            if filled >= slot.count || legs.len() >= TARGET_LEG_COUNT {
                break;
            }
            let pick = &snapshot.candidates[v.idx];
            if !claim(&pick.player, &v.canon_team, &mut used_players, &mut team_counts) {
                continue;
            }
            let label = format!("formula:{}", slot.category);
            taken.insert(v.idx);
            trace[v.idx].status = LegStatus::Selected { slot: label.clone() };
            legs.push(make_leg(snapshot, v, label));
            diagnostics.selected_formula += 1;
            filled += 1;
        }
    }

    if legs.len() < TARGET_LEG_COUNT {
        let mut pool: Vec<&Validated> =
            validated.iter().filter(|v| !taken.contains(&v.idx)).collect();
        sort_by_score(&mut pool);
        for v in pool {
            if legs.len() >= TARGET_LEG_COUNT {
                break;
            }
            let pick = &snapshot.candidates[v.idx];
            if !claim(&pick.player, &v.canon_team, &mut used_players, &mut team_counts) {
                continue;
            }
            taken.insert(v.idx);
            trace[v.idx].status = LegStatus::Selected { slot: "fallback".to_string() };
            legs.push(make_leg(snapshot, v, "fallback".to_string()));
            diagnostics.selected_fallback += 1;
        }
    }

    log::debug!(
        "slate built: {} legs from {} candidates ({} validated)",
        legs.len(),
        diagnostics.total_candidates,
        diagnostics.validated
    );

    BuilderOutput {
        slate_date: snapshot.date,
        preset: preset.name.to_string(),
        legs,
        trace,
        diagnostics,
    }
}

fn make_leg(snapshot: &SlateSnapshot, v: &Validated, slot: String) -> SelectedLeg {
    let pick = &snapshot.candidates[v.idx];
    let env = snapshot.environment(&v.canon_team);
    let h2h = env
        .map(|e| normalize::canonical_team(&e.opponent))
        .and_then(|opp| snapshot.head_to_head(&pick.player, &opp, &pick.stat));
    SelectedLeg {
        pick: pick.clone(),
        h2h: h2h.cloned(),
        environment: env.cloned(),
        defense_rank: v.defense_rank,
        pattern_score: v.pattern_score,
        breakdown: v.breakdown,
        slot,
    }
}

fn sort_by_score(pool: &mut [&Validated]) {
    pool.sort_by(|a, b| {
        b.breakdown
            .total
            .partial_cmp(&a.breakdown.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.idx.cmp(&b.idx))
    });
}

fn claim(
    player: &str,
    canon_team: &str,
    used_players: &mut HashSet<String>,
    team_counts: &mut HashMap<String, usize>,
) -> bool {
    let player_key = player.trim().to_lowercase();
    let team_key = canon_team.trim().to_lowercase();
    if used_players.contains(&player_key) {
        return false;
    }
    if team_counts.get(&team_key).copied().unwrap_or(0) >= MAX_PER_TEAM {
        return false;
    }
    used_players.insert(player_key);
    *team_counts.entry(team_key).or_insert(0) += 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::BALANCED;
    use crate::types::{CandidatePick, GameEnvironment, Side};
    use chrono::NaiveDate;

    fn pick(
        player: &str,
        team: &str,
        stat: &str,
        line: f64,
        side: Side,
        confidence: f64,
        category: Option<&str>,
    ) -> CandidatePick {
        CandidatePick {
            player: player.to_string(),
            team: team.to_string(),
            stat: stat.to_string(),
            line,
            side,
            confidence,
            archetype: None,
            category: category.map(|c| c.to_string()),
            trailing_hit_rate: Some(0.6),
            sample_size: Some(20),
            injury_status: None,
        }
    }

    fn env(total: f64, pace: &str, script: &str, opponent: &str) -> GameEnvironment {
        GameEnvironment {
            total,
            pace: pace.to_string(),
            script: script.to_string(),
            grind_factor: 0.3,
            opponent: opponent.to_string(),
        }
    }

    fn base_snapshot() -> SlateSnapshot {
        SlateSnapshot {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            preset: "balanced".to_string(),
            candidates: Vec::new(),
            h2h: HashMap::new(),
            environments: HashMap::new(),
            defense_ranks: HashMap::new(),
        }
    }

    #[test]
    fn no_duplicate_players_or_teams() {
        let mut snap = base_snapshot();
        snap.candidates = vec![
            pick("A. One", "BOS", "points", 22.5, Side::Over, 0.9, None),
            pick("a. one", "NYK", "rebounds", 8.5, Side::Over, 0.8, None),
            pick("B. Two", "Boston Celtics", "assists", 6.5, Side::Over, 0.8, None),
            pick("C. Three", "DEN", "points", 25.5, Side::Over, 0.7, None),
        ];
        let out = build_slate_with_preset(&snap, &BALANCED);

        let mut players: Vec<String> =
            out.legs.iter().map(|l| l.pick.player.to_lowercase()).collect();
        players.sort();
        players.dedup();
        assert_eq!(players.len(), out.legs.len());

        let mut teams: Vec<String> = out
            .legs
            .iter()
            .map(|l| normalize::canonical_team(&l.pick.team))
            .collect();
        teams.sort();
        teams.dedup();
        assert_eq!(teams.len(), out.legs.len());
        // "a. one" (duplicate player) and the Celtics alias both collide.
        assert_eq!(out.legs.len(), 2);
    }

    #[test]
    fn thin_pool_returns_what_exists() {
        let mut snap = base_snapshot();
        snap.candidates = vec![pick("A. One", "BOS", "points", 22.5, Side::Over, 0.9, None)];
        let out = build_slate_with_preset(&snap, &BALANCED);
        assert_eq!(out.legs.len(), 1);
        assert_eq!(out.diagnostics.selected_fallback, 1);
    }

    #[test]
    fn empty_pool_is_not_an_error() {
        let out = build_slate_with_preset(&base_snapshot(), &BALANCED);
        assert!(out.legs.is_empty());
        assert_eq!(out.diagnostics.total_candidates, 0);
    }

    #[test]
    fn formula_slot_takes_priority_over_raw_score() {
        let mut snap = base_snapshot();
        snap.environments
            .insert("BOS".to_string(), env(210.0, "slow", "competitive", "NYK"));
        snap.candidates = vec![
            // Uncategorized pick with a big confidence edge.
            pick("A. Star", "DEN", "points", 27.5, Side::Over, 0.99, None),
            // Categorized board-crasher matching a formula slot.
            pick(
                "B. Center",
                "BOS",
                "rebounds",
                9.5,
                Side::Over,
                0.55,
                Some("big_man_boards_over"),
            ),
        ];
        let out = build_slate_with_preset(&snap, &BALANCED);
        assert_eq!(out.legs.len(), 2);
        // The formula pass runs first, so the slot pick leads the slate.
        assert_eq!(out.legs[0].pick.player, "B. Center");
        assert_eq!(out.legs[0].slot, "formula:big_man_boards_over");
        assert_eq!(out.legs[1].slot, "fallback");
    }

    #[test]
    fn cap_never_exceeds_target() {
        let mut snap = base_snapshot();
        let teams = ["ATL", "BOS", "BKN", "CHA", "CHI", "CLE", "DAL", "DEN", "DET", "GSW"];
        snap.candidates = (0..10)
            .map(|i| {
                pick(
                    &format!("P. Player{i}"),
                    teams[i],
                    "points",
                    20.5 + i as f64,
                    Side::Over,
                    0.8,
                    None,
                )
            })
            .collect();
        let out = build_slate_with_preset(&snap, &BALANCED);
        assert_eq!(out.legs.len(), TARGET_LEG_COUNT);
        assert_eq!(out.diagnostics.validated, 10);
    }

    #[test]
    fn trace_has_one_row_per_candidate_in_input_order() {
        let mut snap = base_snapshot();
        snap.candidates = vec![
            pick("A. One", "BOS", "points", 0.0, Side::Over, 0.9, None), // sanity reject
            pick("B. Two", "NYK", "points", 22.5, Side::Over, 0.8, None),
        ];
        let out = build_slate_with_preset(&snap, &BALANCED);
        assert_eq!(out.trace.len(), 2);
        assert_eq!(out.trace[0].player, "A. One");
        assert_eq!(out.trace[0].sanity, StageOutcome::Rejected);
        assert_eq!(out.trace[1].archetype, StageOutcome::Passed);
        assert_eq!(out.diagnostics.rejected_sanity, 1);
    }

    #[test]
    fn hard_blocked_candidate_never_selected_even_without_alternatives() {
        let mut snap = base_snapshot();
        // Under pick whose rule demands a defensive rank; none supplied.
        snap.candidates = vec![pick(
            "D. Fade",
            "BOS",
            "points",
            18.5,
            Side::Under,
            0.95,
            Some("grinder_points_under"),
        )];
        snap.environments
            .insert("BOS".to_string(), env(210.0, "slow", "grind", "NYK"));
        let out = build_slate_with_preset(&snap, &BALANCED);
        assert!(out.legs.is_empty());
        assert_eq!(out.diagnostics.rejected_pattern, 1);
    }

    #[test]
    fn unknown_preset_falls_back_to_balanced() {
        let mut snap = base_snapshot();
        snap.preset = "yolo".to_string();
        snap.candidates = vec![pick("A. One", "BOS", "points", 22.5, Side::Over, 0.9, None)];
        let out = build_slate(&snap);
        assert_eq!(out.preset, "balanced");
    }
}
