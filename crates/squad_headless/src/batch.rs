//! Batch match runner for balance testing.
//!
//! Plays one scenario over a range of seeds in parallel using rayon and
//! aggregates the outcomes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use squad_core::events::NullSink;
use squad_core::turn::MatchResult;

use crate::runner::{run_match, MatchSummary};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to play
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Output directory for results
    pub output_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            output_dir: None,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` matches
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played to a result.
    pub total_games: u32,
    /// Player victories.
    pub victories: u32,
    /// Player defeats.
    pub defeats: u32,
    /// Round-limit draws.
    pub draws: u32,
    /// Victories over total games.
    pub player_win_rate: f64,
    /// Average rounds per match.
    pub avg_rounds: f64,
    /// Shortest match in rounds.
    pub min_rounds: u32,
    /// Longest match in rounds.
    pub max_rounds: u32,
    /// Average shots per match.
    pub avg_shots: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of match summaries.
    #[must_use]
    pub fn from_games(games: &[MatchSummary]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as u32;
        let count = |result: MatchResult| games.iter().filter(|g| g.result == result).count() as u32;
        let victories = count(MatchResult::Victory);
        let rounds: u64 = games.iter().map(|g| u64::from(g.rounds)).sum();
        let shots: usize = games.iter().map(|g| g.shots).sum();

        Self {
            total_games: total,
            victories,
            defeats: count(MatchResult::Defeat),
            draws: count(MatchResult::Draw),
            player_win_rate: f64::from(victories) / f64::from(total),
            avg_rounds: rounds as f64 / f64::from(total),
            min_rounds: games.iter().map(|g| g.rounds).min().unwrap_or(0),
            max_rounds: games.iter().map(|g| g.rounds).max().unwrap_or(0),
            avg_shots: shots as f64 / f64::from(total),
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match summaries, in seed order
    pub games: Vec<MatchSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run a batch of matches
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        scenario = %scenario.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<MatchSummary, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_match(scenario, seed, &mut NullSink) {
                Ok(summary) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(summary)
                }
                Err(e) => {
                    warn!("Match {} failed: {}", i, e);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<MatchSummary> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by playing the same seed several times.
///
/// Every run must agree on the full summary, state hash included.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let mut first: Option<MatchSummary> = None;
    for run in 0..runs {
        let summary = match run_match(scenario, seed, &mut NullSink) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(run, error = %e, "Verification run failed");
                return false;
            }
        };
        match &first {
            None => first = Some(summary),
            Some(expected) if *expected != summary => {
                warn!(
                    run,
                    expected = expected.final_state_hash,
                    actual = summary.final_state_hash,
                    "Runs diverged"
                );
                return false;
            }
            Some(_) => {}
        }
    }
    true
}
