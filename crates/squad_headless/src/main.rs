//! Headless squad tactics runner.
//!
//! Plays matches without graphics. Designed for AI tuning, CI testing and
//! determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Autopilot match, events on stdout
//! cargo run -p squad_headless -- run --scenario corridor.ron --seed 7
//!
//! # Interactive match, commands on stdin
//! cargo run -p squad_headless -- play
//!
//! # Batch balance run
//! cargo run -p squad_headless -- batch --count 1000 --output results/
//!
//! # Determinism check
//! cargo run -p squad_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr; filter them with `RUST_LOG` (e.g.
//! `RUST_LOG=squad_core=debug`).

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use squad_core::events::NullSink;
use squad_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_match, HeadlessRunner, JsonLinesSink},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "squad_headless")]
#[command(about = "Headless squad tactics runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match on autopilot and print its events
    Run {
        /// Scenario RON file (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Dice seed (scenario default if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Print only the summary, not every event
        #[arg(short, long)]
        quiet: bool,
    },

    /// Play one match with the player side driven from stdin
    Play {
        /// Scenario RON file (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Dice seed (scenario default if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a batch of matches for balance testing
    Batch {
        /// Scenario RON file (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario RON file (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for events and responses
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .init();

    let outcome = match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            quiet,
        }) => cmd_run(scenario, seed, quiet),
        Some(Commands::Play { scenario, seed }) => cmd_play(scenario, seed),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            output,
        }) => cmd_batch(scenario, count, parallel, seed, output),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(scenario, seed, runs),
        None => cmd_run(None, None, false),
    };

    match outcome {
        Ok(code) => code,
        Err(message) => {
            tracing::error!("{message}");
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<ExitCode, String>;

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, String> {
    let scenario = Scenario::resolve(path.as_deref()).map_err(|e| e.to_string())?;
    tracing::info!(scenario = %scenario.name, "Scenario loaded");
    Ok(scenario)
}

/// Play one autopilot match
fn cmd_run(scenario: Option<PathBuf>, seed: Option<u64>, quiet: bool) -> CmdResult {
    let scenario = load_scenario(scenario)?;
    let seed = seed.unwrap_or(scenario.seed);

    let summary = if quiet {
        run_match(&scenario, seed, &mut NullSink).map_err(|e| e.to_string())?
    } else {
        let mut sink = JsonLinesSink::new(io::BufWriter::new(io::stdout().lock()));
        let summary = run_match(&scenario, seed, &mut sink).map_err(|e| e.to_string())?;
        sink.finish().map_err(|e| format!("Failed to write events: {e}"))?;
        summary
    };

    eprintln!(
        "{}: {:?} after {} rounds (seed {}, hash {:016x})",
        summary.scenario, summary.result, summary.rounds, summary.seed, summary.final_state_hash
    );
    Ok(ExitCode::SUCCESS)
}

/// Play one interactive match
fn cmd_play(scenario: Option<PathBuf>, seed: Option<u64>) -> CmdResult {
    let scenario = load_scenario(scenario)?;
    let seed = seed.unwrap_or(scenario.seed);
    tracing::info!(seed, "Starting interactive session");

    let mut runner = HeadlessRunner::new(&scenario, seed).map_err(|e| e.to_string())?;
    runner
        .run(io::stdin().lock(), io::stdout().lock())
        .map_err(|e| format!("Session failed: {e}"))?;
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of matches for balance testing
fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    parallel: u32,
    seed: u64,
    output: Option<PathBuf>,
) -> CmdResult {
    let scenario = load_scenario(scenario)?;

    let mut config = BatchConfig::new(count).with_seed(seed);
    config.parallel_games = parallel;
    if let Some(dir) = output.clone() {
        config = config.with_output(dir);
    }

    let results = run_batch(&scenario, config);
    let s = &results.summary;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE: {}", results.scenario);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", s.total_games);
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  Match {} (seed {}): {}", error.game_index, error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Victory {} / Defeat {} / Draw {}  (player win rate {:.1}%)",
        s.victories,
        s.defeats,
        s.draws,
        s.player_win_rate * 100.0
    );
    eprintln!(
        "Rounds: avg {:.1}, min {}, max {}; shots per match {:.1}",
        s.avg_rounds, s.min_rounds, s.max_rounds, s.avg_shots
    );

    if let Some(dir) = output {
        let path = dir.join("batch_results.json");
        results
            .save(&path)
            .map_err(|e| format!("Failed to save results to {}: {e}", path.display()))?;
        eprintln!("\nResults saved to: {}", path.display());
    }

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, seed: u64, runs: u32) -> CmdResult {
    let scenario = load_scenario(scenario)?;
    tracing::info!(seed, runs, "Verifying determinism");

    if verify_determinism(&scenario, seed, runs) {
        eprintln!("PASS: {runs} runs of seed {seed} matched");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: runs of seed {seed} diverged");
        Ok(ExitCode::FAILURE)
    }
}
