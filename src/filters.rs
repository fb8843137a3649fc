use crate::normalize::{GameScript, Pace};
use crate::rules;
use crate::types::{CandidatePick, GameEnvironment, H2hRecord, Side};

/// Soft deduction when a rule wants slate context and none exists for the
/// candidate's team.
pub const MISSING_CONTEXT_PENALTY: f64 = -2.0;

const H2H_MIN_GAMES_TO_JUDGE: u32 = 2;
const H2H_MIN_GAMES_TO_BLOCK: u32 = 3;
const H2H_MIN_HIT_RATE: f64 = 0.40;
const H2H_OVER_AVG_FLOOR: f64 = 0.75;
const H2H_UNDER_AVG_CEIL: f64 = 1.25;

const GRIND_UNDER_BONUS_AT: f64 = 0.65;
const GRIND_OVER_POINTS_FADE_AT: f64 = 0.75;

/// Basic shape screen, ahead of any domain rule: a candidate with no usable
/// line, a broken confidence value, or a ruled-out player never reaches the
/// filters. Returns the rejection reason, `None` on pass.
pub fn sanity_reason(pick: &CandidatePick) -> Option<String> {
    if !pick.line.is_finite() || pick.line <= 0.0 {
        return Some("missing or invalid line".to_string());
    }
    if !pick.confidence.is_finite() {
        return Some("invalid model confidence".to_string());
    }
    if let Some(status) = &pick.injury_status {
        let s = status.trim().to_lowercase();
        if s == "out" || s == "doubtful" {
            return Some(format!("ruled {s}"));
        }
    }
    None
}

/// Archetype/stat alignment. Absent or unknown archetypes pass; a blocked
/// stat rejects unless a category override applies.
pub fn archetype_reason(pick: &CandidatePick) -> Option<String> {
    let archetype = pick.archetype.as_deref()?;
    let blocked = rules::blocked_stats(archetype)?;
    let stat = pick.stat.trim().to_lowercase();
    if !blocked.iter().any(|b| *b == stat) {
        return None;
    }
    if let Some(category) = pick.category.as_deref() {
        if rules::override_allows(category, &stat) {
            return None;
        }
    }
    Some(format!("archetype {archetype} is a poor fit for {stat} props"))
}

/// Head-to-head history check. Thin records pass unconditionally; this stage
/// only ever filters, it contributes nothing to the score.
pub fn head_to_head_reason(pick: &CandidatePick, record: Option<&H2hRecord>) -> Option<String> {
    let rec = record?;
    if rec.games < H2H_MIN_GAMES_TO_JUDGE {
        return None;
    }

    if rec.games >= H2H_MIN_GAMES_TO_BLOCK {
        let hit_rate = rec.hit_rate_for(pick.side);
        if hit_rate < H2H_MIN_HIT_RATE {
            return Some(format!(
                "{} hit rate {:.0}% across {} matchups",
                pick.side.as_str(),
                hit_rate * 100.0,
                rec.games
            ));
        }
        match pick.side {
            Side::Over if rec.avg_value < H2H_OVER_AVG_FLOOR * pick.line => {
                return Some(format!(
                    "matchup average {:.1} well below line {:.1}",
                    rec.avg_value, pick.line
                ));
            }
            Side::Under if rec.avg_value > H2H_UNDER_AVG_CEIL * pick.line => {
                return Some(format!(
                    "matchup average {:.1} well above line {:.1}",
                    rec.avg_value, pick.line
                ));
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct PatternOutcome {
    pub pass: bool,
    pub score: f64,
    pub reason: String,
}

impl PatternOutcome {
    fn pass(score: f64, reasons: Vec<String>) -> Self {
        Self { pass: true, score, reason: reasons.join("; ") }
    }

    fn fail(reason: String) -> Self {
        Self { pass: false, score: 0.0, reason }
    }
}

/// Evaluate the candidate against its category rule. Uncategorized picks and
/// picks with no backing rule pass with score zero; everything else walks the
/// fixed check order, accumulating score and a diagnostic reason string.
pub fn validate_pattern(
    pick: &CandidatePick,
    env: Option<&GameEnvironment>,
    defense_rank: Option<u32>,
) -> PatternOutcome {
    let Some(category) = pick.category.as_deref() else {
        return PatternOutcome::pass(0.0, vec!["no category".to_string()]);
    };
    let Some(rule) = rules::rule_for(category) else {
        return PatternOutcome::pass(0.0, vec![format!("no rule for {category}")]);
    };

    if let Some(min) = rule.min_line {
        if pick.line < min {
            return PatternOutcome::fail(format!("line {:.1} below floor {min:.1}", pick.line));
        }
    }
    if let Some(max) = rule.max_line {
        if pick.line > max {
            return PatternOutcome::fail(format!("line {:.1} above ceiling {max:.1}", pick.line));
        }
    }

    let mut score = 2.0;
    let mut reasons = vec!["line within bounds (+2)".to_string()];

    let wants_context = !rule.preferred_scripts.is_empty()
        || !rule.excluded_scripts.is_empty()
        || !rule.preferred_paces.is_empty()
        || rule.min_total.is_some()
        || rule.max_total.is_some();

    let Some(env) = env else {
        // Defense context is mandatory for fading a stat down, and with no
        // environment the opponent cannot be resolved at all.
        if rule.max_defense_rank.is_some() {
            if pick.side == Side::Under {
                return PatternOutcome::fail(
                    "under pick needs a defensive rank and none is available".to_string(),
                );
            }
            score -= 1.0;
            reasons.push("no defensive rank (-1)".to_string());
        }
        if wants_context {
            score += MISSING_CONTEXT_PENALTY;
            reasons.push(format!("no game environment ({MISSING_CONTEXT_PENALTY:+.0})"));
        }
        return PatternOutcome::pass(score, reasons);
    };

    let script = GameScript::from_raw(&env.script);
    if let Some(s) = script {
        if rule.excluded_scripts.contains(&s) {
            return PatternOutcome::fail(format!("{} script excluded for this pattern", s.as_str()));
        }
    }
    if !rule.preferred_scripts.is_empty() {
        match script {
            Some(s) if rule.preferred_scripts.contains(&s) => {
                score += 3.0;
                reasons.push(format!("{} script preferred (+3)", s.as_str()));
            }
            _ => {
                score -= 1.0;
                reasons.push("script not preferred (-1)".to_string());
            }
        }
    }

    if !rule.preferred_paces.is_empty() {
        match Pace::from_raw(&env.pace) {
            Some(p) if rule.preferred_paces.contains(&p) => {
                score += 2.0;
                reasons.push(format!("{} pace preferred (+2)", p.as_str()));
            }
            _ => {
                score -= 1.0;
                reasons.push("pace not preferred (-1)".to_string());
            }
        }
    }

    if let Some(max_total) = rule.max_total {
        if env.total <= max_total {
            score += 2.0;
            reasons.push(format!("total {:.0} under ceiling {max_total:.0} (+2)", env.total));
        } else {
            score -= 2.0;
            reasons.push(format!("total {:.0} over ceiling {max_total:.0} (-2)", env.total));
        }
    }
    if let Some(min_total) = rule.min_total {
        if env.total >= min_total {
            score += 2.0;
            reasons.push(format!("total {:.0} clears floor {min_total:.0} (+2)", env.total));
        } else {
            score -= 1.0;
            reasons.push(format!("total {:.0} under floor {min_total:.0} (-1)", env.total));
        }
    }

    if pick.side == Side::Under && env.grind_factor >= GRIND_UNDER_BONUS_AT {
        score += 1.0;
        reasons.push("grindy game favors the under (+1)".to_string());
    }
    if pick.side == Side::Over
        && pick.stat.trim().eq_ignore_ascii_case("points")
        && env.grind_factor >= GRIND_OVER_POINTS_FADE_AT
    {
        score -= 1.0;
        reasons.push("heavy grind fades scoring (-1)".to_string());
    }

    if let Some(ceiling) = rule.max_defense_rank {
        match defense_rank {
            None => {
                if pick.side == Side::Under {
                    return PatternOutcome::fail(
                        "under pick needs a defensive rank and none is available".to_string(),
                    );
                }
                score -= 1.0;
                reasons.push("no defensive rank (-1)".to_string());
            }
            Some(rank) if rank <= ceiling => {
                score += 4.0;
                reasons.push(format!("defense ranks {rank} (<= {ceiling}) (+4)"));
            }
            Some(rank) => {
                if pick.side == Side::Under {
                    return PatternOutcome::fail(format!(
                        "defense ranks {rank}, too soft to fade (ceiling {ceiling})"
                    ));
                }
                score -= 2.0;
                reasons.push(format!("defense ranks {rank} (> {ceiling}) (-2)"));
            }
        }
    }

    PatternOutcome::pass(score, reasons)
}
