//! Daily slate construction: filter a pool of candidate picks through
//! archetype, matchup-history, and pattern-rule checks, score the survivors
//! under an explicit weight preset, and greedily fill a fixed leg formula.
//! A separate viability simulator stress-tests parlay combinations from the
//! same pool; it advises, it never overrides the built slate.

pub mod builder;
pub mod filters;
pub mod normalize;
pub mod rules;
pub mod scoring;
pub mod simulator;
pub mod snapshot;
pub mod types;
