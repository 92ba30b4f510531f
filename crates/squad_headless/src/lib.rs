//! Headless match runner for AI testing and CI verification.
//!
//! This crate plays squad tactics matches without any presentation layer:
//!
//! - **Autopilot runs**: both sides driven by the decision policy, events
//!   streamed as JSON lines
//! - **Interactive play**: the player side driven by JSON commands on stdin
//! - **Batch balance runs**: one scenario over many seeds, in parallel
//! - **Determinism checks**: replaying a seed must replay the match
//!
//! # Protocol
//!
//! - **stdin**: Commands from the controller (interactive play only)
//! - **stdout**: Events and responses (JSON lines)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] for the interactive command/response format.
//!
//! # Example
//!
//! ```bash
//! # Watch the built-in skirmish play itself
//! cargo run -p squad_headless -- run --seed 7
//!
//! # Play a scenario from stdin
//! cargo run -p squad_headless -- play --scenario scenarios/corridor.ron
//!
//! # Verify determinism
//! cargo run -p squad_headless -- verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use protocol::{Command, Response};
pub use runner::{run_match, HeadlessRunner, JsonLinesSink, MatchSummary};
pub use scenario::{Scenario, ScenarioError};
