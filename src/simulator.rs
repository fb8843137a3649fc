//! Combinatorial viability pass over a candidate pool. Advisory only: it
//! never feeds back into the deterministic slate builder. Combinations come
//! from a greedy depth-first search topped up with seeded shuffles, and each
//! one is priced with a blend of a closed-form estimate and random sampling.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::normalize::canonical_team;
use crate::types::CandidatePick;

/// Unlike the slate builder's one-per-team rule, stacked pairs are allowed
/// here; three or more from one game is where correlation kills a parlay.
pub const MAX_LEGS_PER_TEAM: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViabilityThresholds {
    pub min_win_rate: f64,
    pub min_edge: f64,
    pub min_risk_adjusted: f64,
}

impl Default for ViabilityThresholds {
    fn default() -> Self {
        Self {
            min_win_rate: 0.22,
            min_edge: 0.02,
            min_risk_adjusted: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub target_legs: usize,
    pub max_combinations: usize,
    pub iterations: u32,
    /// Blend weight of the closed-form estimate vs the sampled one.
    pub closed_form_weight: f64,
    /// Strength of the shared per-team shock; 0 simulates legs independently.
    pub correlation_weight: f64,
    pub thresholds: ViabilityThresholds,
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target_legs: 3,
            max_combinations: 48,
            iterations: 2_000,
            closed_form_weight: 0.5,
            correlation_weight: 0.15,
            thresholds: ViabilityThresholds::default(),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimStats {
    pub closed_form: f64,
    pub sampled: f64,
    pub win_prob: f64,
    pub implied_prob: f64,
    pub edge: f64,
    pub expected_value: f64,
    pub risk_adjusted: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedParlay {
    pub legs: Vec<CandidatePick>,
    pub stats: SimStats,
    pub viable: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimStage {
    Generating,
    Simulating,
    Ranking,
    Done,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimProgress {
    pub stage: SimStage,
    pub combos_total: usize,
    pub combos_done: usize,
    // Wall-clock timing is a live-reporting concern only; excluding it from
    // serialization keeps the determinism contract ("identical snapshot +
    // preset => byte-identical output, every call") intact.
    #[serde(skip)]
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub parlays: Vec<SimulatedParlay>,
    pub outcome: RunOutcome,
    pub progress: SimProgress,
}

/// Generate combinations, price each one, and rank the results. Checks the
/// cancel flag between combinations; a cancelled run keeps and ranks
/// everything priced so far. `on_progress` fires after every combination,
/// which is also the host's natural yield point.
pub fn simulate_pool(
    pool: &[CandidatePick],
    cfg: &SimulatorConfig,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(&SimProgress),
) -> SimulationReport {
    let started = Instant::now();
    let mut rng = SmallRng::seed_from_u64(cfg.seed);

    let mut progress = SimProgress {
        stage: SimStage::Generating,
        combos_total: 0,
        combos_done: 0,
        elapsed_ms: 0,
    };
    on_progress(&progress);

    let combos = generate_combinations(pool, cfg, &mut rng);
    progress.stage = SimStage::Simulating;
    progress.combos_total = combos.len();
    progress.elapsed_ms = started.elapsed().as_millis() as u64;
    on_progress(&progress);

    let mut outcome = RunOutcome::Completed;
    let mut parlays: Vec<SimulatedParlay> = Vec::with_capacity(combos.len());
    for combo in &combos {
        if cancel.load(Ordering::Relaxed) {
            outcome = RunOutcome::Cancelled;
            log::debug!("simulation cancelled after {} combinations", parlays.len());
            break;
        }
        parlays.push(simulate_combo(pool, combo, cfg, &mut rng));
        progress.combos_done += 1;
        progress.elapsed_ms = started.elapsed().as_millis() as u64;
        on_progress(&progress);
    }

    progress.stage = SimStage::Ranking;
    on_progress(&progress);
    rank(&mut parlays);

    progress.stage = SimStage::Done;
    progress.elapsed_ms = started.elapsed().as_millis() as u64;
    on_progress(&progress);

    SimulationReport { parlays, outcome, progress }
}

/// Single-leg win probability: model confidence, pulled toward the trailing
/// hit rate when one exists, clamped away from the degenerate edges.
fn leg_win_prob(pick: &CandidatePick) -> f64 {
    let conf = if pick.confidence.is_finite() {
        pick.confidence.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let p = match pick.trailing_hit_rate {
        Some(r) => 0.7 * conf + 0.3 * r.clamp(0.0, 1.0),
        None => conf,
    };
    p.clamp(0.02, 0.98)
}

fn payout_multiplier(legs: usize) -> f64 {
    match legs {
        0 => 1.0,
        1 => 1.8,
        2 => 3.0,
        3 => 5.0,
        4 => 10.0,
        5 => 20.0,
        _ => 35.0,
    }
}

fn combo_is_extendable(
    pool: &[CandidatePick],
    combo: &[usize],
    next: usize,
) -> bool {
    let player = pool[next].player.trim().to_lowercase();
    let team = canonical_team(&pool[next].team);
    let mut team_count = 1usize;
    for &i in combo {
        if pool[i].player.trim().to_lowercase() == player {
            return false;
        }
        if canonical_team(&pool[i].team) == team {
            team_count += 1;
        }
    }
    team_count <= MAX_LEGS_PER_TEAM
}

fn generate_combinations(
    pool: &[CandidatePick],
    cfg: &SimulatorConfig,
    rng: &mut SmallRng,
) -> Vec<Vec<usize>> {
    if cfg.target_legs == 0 || pool.len() < cfg.target_legs || cfg.max_combinations == 0 {
        return Vec::new();
    }

    // Strongest legs first so the depth-first walk surfaces the best
    // stacks before the cap cuts it off.
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|a, b| {
        leg_win_prob(&pool[*b])
            .partial_cmp(&leg_win_prob(&pool[*a]))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });

    let mut out: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut current: Vec<usize> = Vec::with_capacity(cfg.target_legs);
    dfs(pool, cfg, &order, 0, &mut current, &mut out, &mut seen);

    // The greedy walk can underproduce on small or conflict-heavy pools;
    // top up from randomized orderings.
    let mut attempts = 0usize;
    let max_attempts = cfg.max_combinations.saturating_mul(20);
    let mut shuffled = order;
    while out.len() < cfg.max_combinations && attempts < max_attempts {
        attempts += 1;
        shuffled.shuffle(rng);
        let mut combo: Vec<usize> = Vec::with_capacity(cfg.target_legs);
        for &i in &shuffled {
            if combo.len() == cfg.target_legs {
                break;
            }
            if combo_is_extendable(pool, &combo, i) {
                combo.push(i);
            }
        }
        if combo.len() != cfg.target_legs {
            continue;
        }
        let mut key = combo.clone();
        key.sort_unstable();
        if seen.insert(key) {
            out.push(combo);
        }
    }

    out
}

fn dfs(
    pool: &[CandidatePick],
    cfg: &SimulatorConfig,
    order: &[usize],
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
    seen: &mut HashSet<Vec<usize>>,
) {
    if out.len() >= cfg.max_combinations {
        return;
    }
    if current.len() == cfg.target_legs {
        let mut key = current.clone();
        key.sort_unstable();
        if seen.insert(key) {
            out.push(current.clone());
        }
        return;
    }
    for pos in start..order.len() {
        if out.len() >= cfg.max_combinations {
            return;
        }
        let i = order[pos];
        if !combo_is_extendable(pool, current, i) {
            continue;
        }
        current.push(i);
        dfs(pool, cfg, order, pos + 1, current, out, seen);
        current.pop();
    }
}

fn simulate_combo(
    pool: &[CandidatePick],
    combo: &[usize],
    cfg: &SimulatorConfig,
    rng: &mut SmallRng,
) -> SimulatedParlay {
    let legs: Vec<&CandidatePick> = combo.iter().map(|&i| &pool[i]).collect();
    let probs: Vec<f64> = legs.iter().map(|p| leg_win_prob(p)).collect();
    let teams: Vec<String> = legs.iter().map(|p| canonical_team(&p.team)).collect();

    let closed_form: f64 = probs.iter().product();

    let iterations = cfg.iterations.max(1);
    let mut wins = 0u32;
    for _ in 0..iterations {
        let mut shocks: HashMap<&str, f64> = HashMap::new();
        let mut all_hit = true;
        // No early exit on a miss: every leg consumes exactly one uniform
        // per trial, keeping the draw stream aligned across combinations.
        for (k, p) in probs.iter().enumerate() {
            let p = if cfg.correlation_weight > 0.0 {
                let shock = *shocks.entry(teams[k].as_str()).or_insert_with(|| {
                    (rng.r#gen::<f64>() - 0.5) * cfg.correlation_weight
                });
                (p + shock).clamp(0.01, 0.99)
            } else {
                *p
            };
            if rng.r#gen::<f64>() >= p {
                all_hit = false;
            }
        }
        if all_hit {
            wins += 1;
        }
    }
    let sampled = wins as f64 / iterations as f64;

    let w = cfg.closed_form_weight.clamp(0.0, 1.0);
    let win_prob = w * closed_form + (1.0 - w) * sampled;

    let multiplier = payout_multiplier(combo.len());
    let implied_prob = 1.0 / multiplier;
    let edge = win_prob - implied_prob;
    let expected_value = win_prob * multiplier - 1.0;
    let payout_std = multiplier * (win_prob * (1.0 - win_prob)).sqrt();
    let risk_adjusted = if payout_std > 1e-9 {
        expected_value / payout_std
    } else {
        0.0
    };

    let t = &cfg.thresholds;
    let mut reasons: Vec<String> = Vec::new();
    if win_prob < t.min_win_rate {
        reasons.push(format!(
            "win rate {:.1}% below {:.1}% floor",
            win_prob * 100.0,
            t.min_win_rate * 100.0
        ));
    }
    if edge < t.min_edge {
        reasons.push(format!(
            "edge {:+.1}% below {:+.1}% floor",
            edge * 100.0,
            t.min_edge * 100.0
        ));
    }
    if risk_adjusted < t.min_risk_adjusted {
        reasons.push(format!(
            "risk-adjusted {:.2} below {:.2} floor",
            risk_adjusted, t.min_risk_adjusted
        ));
    }
    if expected_value < 0.0 {
        reasons.push(format!("negative expected value ({expected_value:.2})"));
    }

    SimulatedParlay {
        legs: legs.into_iter().cloned().collect(),
        stats: SimStats {
            closed_form,
            sampled,
            win_prob,
            implied_prob,
            edge,
            expected_value,
            risk_adjusted,
        },
        viable: reasons.is_empty(),
        reasons,
    }
}

fn rank(parlays: &mut [SimulatedParlay]) {
    parlays.sort_by(|a, b| {
        b.viable
            .cmp(&a.viable)
            .then(
                b.stats
                    .risk_adjusted
                    .partial_cmp(&a.stats.risk_adjusted)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
}
