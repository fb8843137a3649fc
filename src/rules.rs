use crate::normalize::{GameScript, Pace};
use crate::types::Side;

/// Target composition for one slate.
pub const TARGET_LEG_COUNT: usize = 6;
/// At most one leg per team in the built slate.
pub const MAX_PER_TEAM: usize = 1;

/// Static validation rule backing one betting category.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub category: &'static str,
    pub stat: &'static str,
    pub min_line: Option<f64>,
    pub max_line: Option<f64>,
    pub preferred_scripts: &'static [GameScript],
    pub excluded_scripts: &'static [GameScript],
    pub preferred_paces: &'static [Pace],
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    /// Opposing defense must rank at or above this (1 = strongest) for the
    /// matchup bonus; mandatory context for under picks.
    pub max_defense_rank: Option<u32>,
}

/// Canonical category table. Superseded historical categories are gone for
/// good; only this version is rule-backed and test-covered.
pub const RULES: &[PatternRule] = &[
    PatternRule {
        category: "volume_scorer_points_over",
        stat: "points",
        min_line: Some(19.5),
        max_line: Some(32.5),
        preferred_scripts: &[GameScript::Shootout, GameScript::Competitive],
        excluded_scripts: &[GameScript::Blowout],
        preferred_paces: &[Pace::Fast],
        min_total: Some(226.0),
        max_total: None,
        max_defense_rank: None,
    },
    PatternRule {
        category: "big_man_boards_over",
        stat: "rebounds",
        min_line: Some(7.5),
        max_line: Some(14.5),
        preferred_scripts: &[GameScript::Competitive],
        excluded_scripts: &[],
        preferred_paces: &[Pace::Slow],
        min_total: None,
        max_total: Some(222.0),
        max_defense_rank: None,
    },
    PatternRule {
        category: "floor_general_dimes_over",
        stat: "assists",
        min_line: Some(5.5),
        max_line: Some(11.5),
        preferred_scripts: &[GameScript::Competitive, GameScript::Shootout],
        excluded_scripts: &[GameScript::Blowout],
        preferred_paces: &[Pace::Fast],
        min_total: Some(224.0),
        max_total: None,
        max_defense_rank: None,
    },
    PatternRule {
        category: "grinder_points_under",
        stat: "points",
        min_line: Some(12.5),
        max_line: Some(24.5),
        preferred_scripts: &[GameScript::Grind],
        excluded_scripts: &[GameScript::Shootout],
        preferred_paces: &[Pace::Slow],
        min_total: None,
        max_total: Some(216.0),
        max_defense_rank: Some(10),
    },
    PatternRule {
        category: "wing_threes_over",
        stat: "threes",
        min_line: Some(1.5),
        max_line: Some(4.5),
        preferred_scripts: &[GameScript::Shootout],
        excluded_scripts: &[GameScript::Grind],
        preferred_paces: &[Pace::Fast],
        min_total: Some(228.0),
        max_total: None,
        max_defense_rank: None,
    },
    PatternRule {
        category: "anchor_boards_under",
        stat: "rebounds",
        min_line: Some(6.5),
        max_line: Some(12.5),
        preferred_scripts: &[GameScript::Grind],
        excluded_scripts: &[GameScript::Shootout],
        preferred_paces: &[Pace::Slow],
        min_total: None,
        max_total: Some(218.0),
        max_defense_rank: Some(8),
    },
    PatternRule {
        category: "secondary_dimes_under",
        stat: "assists",
        min_line: Some(4.5),
        max_line: Some(9.5),
        preferred_scripts: &[GameScript::Blowout, GameScript::Grind],
        excluded_scripts: &[],
        preferred_paces: &[Pace::Slow],
        min_total: None,
        max_total: Some(220.0),
        max_defense_rank: Some(12),
    },
];

pub fn rule_for(category: &str) -> Option<&'static PatternRule> {
    let want = category.trim().to_lowercase();
    RULES.iter().find(|r| r.category == want)
}

/// Stats an archetype is a known poor fit for.
pub const ARCHETYPE_BLOCKS: &[(&str, &[&str])] = &[
    ("rim_runner", &["threes", "assists"]),
    ("post_anchor", &["threes"]),
    ("spot_up_shooter", &["assists", "rebounds"]),
    ("lockdown_wing", &["points"]),
];

/// Category + stat combinations exempt from the archetype rule. The
/// playmaking category stays open for assist props even for archetypes the
/// general rule would block.
pub const CATEGORY_OVERRIDES: &[(&str, &str)] = &[
    ("floor_general_dimes_over", "assists"),
    ("big_man_boards_over", "rebounds"),
];

pub fn blocked_stats(archetype: &str) -> Option<&'static [&'static str]> {
    let want = archetype.trim().to_lowercase();
    ARCHETYPE_BLOCKS
        .iter()
        .find(|(arch, _)| *arch == want)
        .map(|(_, stats)| *stats)
}

pub fn override_allows(category: &str, stat: &str) -> bool {
    let cat = category.trim().to_lowercase();
    let st = stat.trim().to_lowercase();
    CATEGORY_OVERRIDES
        .iter()
        .any(|(c, s)| *c == cat && *s == st)
}

#[derive(Debug, Clone, Copy)]
pub struct FormulaSlot {
    pub category: &'static str,
    pub side: Side,
    pub count: usize,
}

/// Ordered slate composition; filled greedily in this order before the
/// fallback pass tops the slate up from the general pool.
pub const FORMULA_SLOTS: &[FormulaSlot] = &[
    FormulaSlot { category: "volume_scorer_points_over", side: Side::Over, count: 1 },
    FormulaSlot { category: "big_man_boards_over", side: Side::Over, count: 1 },
    FormulaSlot { category: "floor_general_dimes_over", side: Side::Over, count: 1 },
    FormulaSlot { category: "grinder_points_under", side: Side::Under, count: 1 },
    FormulaSlot { category: "wing_threes_over", side: Side::Over, count: 1 },
    FormulaSlot { category: "anchor_boards_under", side: Side::Under, count: 1 },
];
