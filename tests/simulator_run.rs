use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use slate_builder::simulator::{simulate_pool, RunOutcome, SimStage, SimulatorConfig};
use slate_builder::snapshot::parse_snapshot;

fn fixture_candidates() -> slate_builder::snapshot::SlateSnapshot {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("slate_2026_03_14.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_snapshot(&raw).expect("fixture parses")
}

#[test]
fn seeded_runs_reproduce_exactly() {
    let snap = fixture_candidates();
    let cfg = SimulatorConfig { target_legs: 3, seed: 7, ..SimulatorConfig::default() };
    let cancel = AtomicBool::new(false);

    let a = simulate_pool(&snap.candidates, &cfg, &cancel, |_| {});
    let b = simulate_pool(&snap.candidates, &cfg, &cancel, |_| {});
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert_eq!(a.outcome, RunOutcome::Completed);
    assert!(!a.parlays.is_empty());
}

#[test]
fn progress_walks_the_stages_in_order() {
    let snap = fixture_candidates();
    let cfg = SimulatorConfig { target_legs: 3, iterations: 200, ..SimulatorConfig::default() };
    let cancel = AtomicBool::new(false);

    let mut stages: Vec<SimStage> = Vec::new();
    let report = simulate_pool(&snap.candidates, &cfg, &cancel, |p| {
        if stages.last() != Some(&p.stage) {
            stages.push(p.stage);
        }
    });
    assert_eq!(
        stages,
        vec![SimStage::Generating, SimStage::Simulating, SimStage::Ranking, SimStage::Done]
    );
    assert_eq!(report.progress.combos_done, report.progress.combos_total);
}

#[test]
fn mid_run_cancel_returns_partial_ranking() {
    let snap = fixture_candidates();
    let cfg = SimulatorConfig { target_legs: 3, iterations: 200, ..SimulatorConfig::default() };
    let cancel = AtomicBool::new(false);

    let report = simulate_pool(&snap.candidates, &cfg, &cancel, |p| {
        if p.stage == SimStage::Simulating && p.combos_done == 3 {
            cancel.store(true, Ordering::Relaxed);
        }
    });
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.parlays.len(), 3);
    // Partial results are still ranked: viable ones lead.
    for pair in report.parlays.windows(2) {
        assert!(pair[0].viable >= pair[1].viable);
    }
}
