use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    Medium,
    Fast,
}

impl Pace {
    /// Map free-form pace wording (including legacy vocabulary) onto the
    /// fixed slow/medium/fast set. Unknown wording yields `None`, which rule
    /// evaluation treats as "no match".
    pub fn from_raw(raw: &str) -> Option<Pace> {
        let s = raw.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }
        if s.contains("slow") || s.contains("plodding") || s.contains("half-court") || s.contains("halfcourt") || s.contains("grind") {
            return Some(Pace::Slow);
        }
        if s.contains("medium") || s.contains("average") || s.contains("moderate") || s.contains("neutral") || s.contains("mid") {
            return Some(Pace::Medium);
        }
        if s.contains("fast") || s.contains("up-tempo") || s.contains("uptempo") || s.contains("run-and-gun") || s.contains("quick") || s.contains("transition") {
            return Some(Pace::Fast);
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pace::Slow => "slow",
            Pace::Medium => "medium",
            Pace::Fast => "fast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameScript {
    Blowout,
    Competitive,
    Grind,
    Shootout,
}

impl GameScript {
    pub fn from_raw(raw: &str) -> Option<GameScript> {
        let s = raw.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }
        if s.contains("blowout") || s.contains("lopsided") || s.contains("rout") {
            return Some(GameScript::Blowout);
        }
        if s.contains("shootout") || s.contains("track meet") || s.contains("high-scoring") {
            return Some(GameScript::Shootout);
        }
        if s.contains("grind") || s.contains("rock fight") || s.contains("defensive") {
            return Some(GameScript::Grind);
        }
        if s.contains("competitive") || s.contains("close") || s.contains("tight") || s.contains("toss-up") || s.contains("tossup") {
            return Some(GameScript::Competitive);
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameScript::Blowout => "blowout",
            GameScript::Competitive => "competitive",
            GameScript::Grind => "grind",
            GameScript::Shootout => "shootout",
        }
    }
}

static TEAM_ABBRS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let entries: &[(&str, &[&str])] = &[
        ("ATL", &["atlanta hawks", "hawks", "atlanta"]),
        ("BOS", &["boston celtics", "celtics", "boston"]),
        ("BKN", &["brooklyn nets", "nets", "brooklyn"]),
        ("CHA", &["charlotte hornets", "hornets", "charlotte"]),
        ("CHI", &["chicago bulls", "bulls", "chicago"]),
        ("CLE", &["cleveland cavaliers", "cavaliers", "cavs", "cleveland"]),
        ("DAL", &["dallas mavericks", "mavericks", "mavs", "dallas"]),
        ("DEN", &["denver nuggets", "nuggets", "denver"]),
        ("DET", &["detroit pistons", "pistons", "detroit"]),
        ("GSW", &["golden state warriors", "warriors", "golden state"]),
        ("HOU", &["houston rockets", "rockets", "houston"]),
        ("IND", &["indiana pacers", "pacers", "indiana"]),
        ("LAC", &["la clippers", "los angeles clippers", "clippers"]),
        ("LAL", &["los angeles lakers", "la lakers", "lakers"]),
        ("MEM", &["memphis grizzlies", "grizzlies", "memphis"]),
        ("MIA", &["miami heat", "heat", "miami"]),
        ("MIL", &["milwaukee bucks", "bucks", "milwaukee"]),
        ("MIN", &["minnesota timberwolves", "timberwolves", "wolves", "minnesota"]),
        ("NOP", &["new orleans pelicans", "pelicans", "new orleans"]),
        ("NYK", &["new york knicks", "knicks", "new york"]),
        ("OKC", &["oklahoma city thunder", "thunder", "oklahoma city"]),
        ("ORL", &["orlando magic", "magic", "orlando"]),
        ("PHI", &["philadelphia 76ers", "76ers", "sixers", "philadelphia"]),
        ("PHX", &["phoenix suns", "suns", "phoenix"]),
        ("POR", &["portland trail blazers", "trail blazers", "blazers", "portland"]),
        ("SAC", &["sacramento kings", "kings", "sacramento"]),
        ("SAS", &["san antonio spurs", "spurs", "san antonio"]),
        ("TOR", &["toronto raptors", "raptors", "toronto"]),
        ("UTA", &["utah jazz", "jazz", "utah"]),
        ("WAS", &["washington wizards", "wizards", "washington"]),
    ];
    for (abbr, aliases) in entries {
        for alias in *aliases {
            m.insert(*alias, *abbr);
        }
    }
    m
});

/// Resolve a team reference to its canonical abbreviation. Inputs that
/// already look like an abbreviation pass through upper-cased; anything
/// unrecognized falls back to its first three letters.
pub fn canonical_team(raw: &str) -> String {
    let s = raw.trim().to_lowercase();
    if let Some(abbr) = TEAM_ABBRS.get(s.as_str()) {
        return (*abbr).to_string();
    }
    let compact: String = s.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if compact.len() >= 2 && compact.len() <= 4 && !s.contains(' ') {
        return compact.to_uppercase();
    }
    compact.chars().take(3).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_maps_legacy_vocabulary() {
        assert_eq!(Pace::from_raw("Plodding"), Some(Pace::Slow));
        assert_eq!(Pace::from_raw("up-tempo"), Some(Pace::Fast));
        assert_eq!(Pace::from_raw("AVERAGE"), Some(Pace::Medium));
        assert_eq!(Pace::from_raw("run-and-gun"), Some(Pace::Fast));
        assert_eq!(Pace::from_raw("???"), None);
        assert_eq!(Pace::from_raw(""), None);
    }

    #[test]
    fn script_maps_legacy_vocabulary() {
        assert_eq!(GameScript::from_raw("rock fight"), Some(GameScript::Grind));
        assert_eq!(GameScript::from_raw("Toss-up"), Some(GameScript::Competitive));
        assert_eq!(GameScript::from_raw("track meet"), Some(GameScript::Shootout));
        assert_eq!(GameScript::from_raw("lopsided"), Some(GameScript::Blowout));
        assert_eq!(GameScript::from_raw("unknown"), None);
    }

    #[test]
    fn team_names_resolve_to_abbreviations() {
        assert_eq!(canonical_team("Boston Celtics"), "BOS");
        assert_eq!(canonical_team("celtics"), "BOS");
        assert_eq!(canonical_team("LAL"), "LAL");
        assert_eq!(canonical_team("bos"), "BOS");
        // Unknown names degrade instead of erroring.
        assert_eq!(canonical_team("Springfield Atoms"), "SPR");
    }
}
