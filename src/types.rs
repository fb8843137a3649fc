use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Over => "over",
            Side::Under => "under",
        }
    }
}

/// One proposed leg as fetched from the pick pool. Never mutated by the
/// engine; derived values live in the trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePick {
    pub player: String,
    pub team: String,
    pub stat: String,
    #[serde(default)]
    pub line: f64,
    pub side: Side,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub trailing_hit_rate: Option<f64>,
    #[serde(default)]
    pub sample_size: Option<u32>,
    #[serde(default)]
    pub injury_status: Option<String>,
}

/// Historical matchup line for (player, opponent, stat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct H2hRecord {
    pub games: u32,
    pub avg_value: f64,
    pub hit_rate_over: f64,
    pub hit_rate_under: f64,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default)]
    pub max_value: f64,
}

impl H2hRecord {
    pub fn hit_rate_for(&self, side: Side) -> f64 {
        match side {
            Side::Over => self.hit_rate_over,
            Side::Under => self.hit_rate_under,
        }
    }
}

/// Per-team slate context. Pace and script keep the provider's free-form
/// wording; normalization happens at rule-evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEnvironment {
    pub total: f64,
    pub pace: String,
    pub script: String,
    #[serde(default)]
    pub grind_factor: f64,
    pub opponent: String,
}

/// Weighted contributions that make up one candidate's final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pattern: f64,
    pub reliability: f64,
    pub confidence: f64,
    pub missing_penalty: f64,
    pub sample_penalty: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Passed,
    Rejected,
    /// Earlier stage already rejected the candidate, so this one never ran.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegStatus {
    Selected { slot: String },
    Rejected { reason: String },
}

/// Per-candidate audit row. One per input candidate, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRow {
    pub player: String,
    pub team: String,
    pub stat: String,
    pub line: f64,
    pub side: Side,
    pub category: Option<String>,
    pub sanity: StageOutcome,
    pub archetype: StageOutcome,
    pub head_to_head: StageOutcome,
    pub pattern: StageOutcome,
    pub pattern_score: f64,
    pub pattern_reason: String,
    pub breakdown: Option<ScoreBreakdown>,
    pub status: LegStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total_candidates: usize,
    pub rejected_sanity: usize,
    pub rejected_archetype: usize,
    pub rejected_head_to_head: usize,
    pub rejected_pattern: usize,
    pub validated: usize,
    pub selected_formula: usize,
    pub selected_fallback: usize,
}

/// A selected leg with the context it was judged against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedLeg {
    pub pick: CandidatePick,
    pub h2h: Option<H2hRecord>,
    pub environment: Option<GameEnvironment>,
    pub defense_rank: Option<u32>,
    pub pattern_score: f64,
    pub breakdown: ScoreBreakdown,
    pub slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderOutput {
    pub slate_date: NaiveDate,
    pub preset: String,
    pub legs: Vec<SelectedLeg>,
    pub trace: Vec<TraceRow>,
    pub diagnostics: Diagnostics,
}
