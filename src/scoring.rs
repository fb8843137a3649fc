use crate::types::{CandidatePick, ScoreBreakdown};

/// Sample depth below which a category's backing evidence is penalized.
const MIN_SAMPLE: u32 = 10;
const SAMPLE_PENALTY: f64 = -0.5;

/// Named weight vector. Always passed explicitly; there is no ambient
/// active preset.
#[derive(Debug, Clone, Copy)]
pub struct WeightPreset {
    pub name: &'static str,
    pub pattern_weight: f64,
    pub reliability_weight: f64,
    pub confidence_weight: f64,
    pub default_reliability: f64,
    pub default_confidence: f64,
    /// Applied whenever the trailing hit-rate signal is absent. Sized so the
    /// default fill-in can never beat a known equal-or-lower signal.
    pub missing_reliability_penalty: f64,
}

pub const BALANCED: WeightPreset = WeightPreset {
    name: "balanced",
    pattern_weight: 1.0,
    reliability_weight: 2.0,
    confidence_weight: 0.25,
    default_reliability: 0.50,
    default_confidence: 0.60,
    missing_reliability_penalty: -1.5,
};

pub const RELIABILITY_MAX: WeightPreset = WeightPreset {
    name: "reliability_max",
    pattern_weight: 0.75,
    reliability_weight: 3.0,
    confidence_weight: 0.15,
    default_reliability: 0.45,
    default_confidence: 0.55,
    missing_reliability_penalty: -2.0,
};

pub const SHARP: WeightPreset = WeightPreset {
    name: "sharp",
    pattern_weight: 1.25,
    reliability_weight: 1.5,
    confidence_weight: 0.60,
    default_reliability: 0.50,
    default_confidence: 0.60,
    missing_reliability_penalty: -1.0,
};

pub const PRESETS: &[WeightPreset] = &[BALANCED, RELIABILITY_MAX, SHARP];

pub fn preset_by_name(name: &str) -> Option<&'static WeightPreset> {
    let want = name.trim().to_lowercase();
    PRESETS.iter().find(|p| p.name == want)
}

/// Combine the pattern score with the candidate's own signals under one
/// preset. Missing optional signals resolve to the preset defaults.
pub fn score_candidate(
    pick: &CandidatePick,
    pattern_score: f64,
    preset: &WeightPreset,
) -> ScoreBreakdown {
    let (reliability, missing_penalty) = match pick.trailing_hit_rate {
        Some(r) => (r.clamp(0.0, 1.0), 0.0),
        None => (preset.default_reliability, preset.missing_reliability_penalty),
    };

    let confidence = if pick.confidence.is_finite() && pick.confidence > 0.0 {
        pick.confidence.clamp(0.0, 1.0)
    } else {
        preset.default_confidence
    };

    let sample_penalty = match pick.sample_size {
        Some(n) if n >= MIN_SAMPLE => 0.0,
        // An absent sample cannot attest to depth; it counts as shallow.
        _ => SAMPLE_PENALTY,
    };

    let pattern = pattern_score * preset.pattern_weight;
    let reliability = reliability * preset.reliability_weight;
    let confidence = confidence * preset.confidence_weight;

    ScoreBreakdown {
        pattern,
        reliability,
        confidence,
        missing_penalty,
        sample_penalty,
        total: pattern + reliability + confidence + missing_penalty + sample_penalty,
    }
}
