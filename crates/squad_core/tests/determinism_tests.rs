//! Replaying a seed must replay the match.

use squad_core::turn::MatchResult;
use squad_test_utils::determinism::{
    find_first_divergence, run_parallel_matches, strategies, verify_event_log_determinism,
    verify_match_determinism,
};
use squad_test_utils::fixtures::autopilot_skirmish;
use proptest::prelude::*;

#[test]
fn test_same_seed_same_match() {
    assert!(verify_match_determinism(|| autopilot_skirmish(1234), 0));
    assert!(verify_event_log_determinism(|| autopilot_skirmish(1234)));
}

#[test]
fn test_parallel_runs_agree() {
    let hashes = run_parallel_matches(|| autopilot_skirmish(77), 4);
    assert_eq!(hashes.len(), 4);
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_skirmish_always_ends() {
    for seed in 0..8 {
        let sim = autopilot_skirmish(seed);
        assert!(
            matches!(
                sim.result(),
                Some(MatchResult::Victory | MatchResult::Defeat | MatchResult::Draw)
            ),
            "seed {seed} did not finish"
        );
    }
}

#[test]
fn test_no_divergence_after_finish() {
    assert_eq!(find_first_divergence(|| autopilot_skirmish(5), 3), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_any_seed_replays(seed in strategies::arb_seed()) {
        let a = autopilot_skirmish(seed);
        let b = autopilot_skirmish(seed);
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.result(), b.result());
    }
}
