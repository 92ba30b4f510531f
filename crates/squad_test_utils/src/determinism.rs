//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seed and a scenario must replay the same match every time, or batch
//! balance runs and bug reports are worthless. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: world positions use
//!   [`squad_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: units live in a `BTreeMap` and rosters
//!   are plain vectors.
//!
//! - **System randomness**: every roll goes through injected
//!   [`squad_core::dice::Dice`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use squad_core::events::MatchEvent;
use squad_core::simulation::TacticsSim;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a match multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the match
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial match state
/// * `step` - Function to advance the match by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Run a match twice, ending the active unit's turn `turns` times, and
/// compare the final state hashes.
///
/// With the player side on autopilot `setup_fn` already plays the whole
/// match and `turns` can be zero.
pub fn verify_match_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> TacticsSim,
{
    let result = verify_determinism(
        2,
        turns,
        &setup_fn,
        |sim| {
            sim.end_current_unit_turn();
        },
        TacticsSim::state_hash,
    );
    result.is_deterministic
}

/// Run a match twice and compare the full event logs.
///
/// Stricter than hashing the end state: every roll that changed a shot,
/// a step or a facing shows up.
pub fn verify_event_log_determinism<F>(setup_fn: F) -> bool
where
    F: Fn() -> TacticsSim,
{
    let first: Vec<MatchEvent> = setup_fn().drain_events();
    let second: Vec<MatchEvent> = setup_fn().drain_events();
    first == second
}

/// Run `num_sims` matches on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a match thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_sims: usize) -> Vec<u64>
where
    F: Fn() -> TacticsSim + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| s.spawn(|| setup_fn().state_hash()))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    })
}

/// Compare two runs turn by turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(turn)` if they diverge after that
/// many turn ends (0 means right after setup).
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> TacticsSim,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        sim1.end_current_unit_turn();
        sim2.end_current_unit_turn();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for match inputs.
pub mod strategies {
    use proptest::prelude::*;
    use squad_core::ai::AiWeights;
    use squad_core::grid::GridCoord;

    /// A coordinate inside a `size` x `size` map.
    pub fn arb_coord(size: i32) -> impl Strategy<Value = GridCoord> {
        (0..size, 0..size).prop_map(|(x, y)| GridCoord::new(x, y))
    }

    /// Raw, unnormalised weights, including out-of-range values.
    pub fn arb_raw_weights() -> impl Strategy<Value = AiWeights> {
        (-5i32..20, -5i32..20, -5i32..20, -5i32..20).prop_map(|(shoot, movement, cover, overwatch)| {
            AiWeights {
                shoot,
                movement,
                cover,
                overwatch,
            }
        })
    }

    /// A match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}
