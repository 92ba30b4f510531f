//! Headless match runner implementation.
//!
//! Two ways to play a scenario:
//!
//! - [`run_match`]: both sides on autopilot, events streamed to a sink
//! - [`HeadlessRunner`]: the player side driven by JSON commands

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};

use squad_core::events::{MatchEvent, PresentationSink};
use squad_core::grid::GridCoord;
use squad_core::simulation::{MoveOutcome, TacticsSim};
use squad_core::turn::MatchResult;
use squad_core::unit::{Side, UnitId};

use crate::protocol::{Command, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Writes every event as one JSON line.
///
/// The first write error is kept and every later event is dropped.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Events written so far.
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the writer, or the first error hit.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_event(&mut self, event: &MatchEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> PresentationSink for JsonLinesSink<W> {
    fn on_event(&mut self, event: &MatchEvent) {
        if self.error.is_some() {
            return;
        }
        match self.write_event(event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write event");
                self.error = Some(e);
            }
        }
    }
}

/// Counts events without keeping them.
struct CountingSink<'a> {
    inner: &'a mut dyn PresentationSink,
    count: usize,
    shots: usize,
    deaths: usize,
}

impl PresentationSink for CountingSink<'_> {
    fn on_event(&mut self, event: &MatchEvent) {
        self.count += 1;
        match event {
            MatchEvent::ShotFired(_) => self.shots += 1,
            MatchEvent::UnitDied { .. } => self.deaths += 1,
            _ => {}
        }
        self.inner.on_event(event);
    }
}

/// Outcome of one autopilot match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Scenario name.
    pub scenario: String,
    /// Dice seed.
    pub seed: u64,
    /// Final result.
    pub result: MatchResult,
    /// Rounds played.
    pub rounds: u32,
    /// Events emitted.
    pub events: usize,
    /// Shots taken, aimed and reactive.
    pub shots: usize,
    /// Units killed.
    pub deaths: usize,
    /// Player units left standing.
    pub player_survivors: usize,
    /// Enemy units left standing.
    pub enemy_survivors: usize,
    /// State hash at the end.
    pub final_state_hash: u64,
}

/// Play `scenario` with `seed`, both sides on autopilot.
///
/// Every event is passed to `sink` as it is drained; pass
/// [`NullSink`](squad_core::events::NullSink) to discard them.
///
/// # Errors
///
/// Returns [`ScenarioError`] if the scenario does not build.
pub fn run_match(
    scenario: &Scenario,
    seed: u64,
    sink: &mut dyn PresentationSink,
) -> Result<MatchSummary, ScenarioError> {
    let mut sim = scenario.build(seed, true)?;
    let mut counter = CountingSink {
        inner: sink,
        count: 0,
        shots: 0,
        deaths: 0,
    };
    sim.drain_events_into(&mut counter);

    // Full autopilot always plays to a result; the round cap draws a stalemate.
    let result = sim.result().unwrap_or(MatchResult::Draw);

    let survivors = |side: Side| sim.units().filter(|u| u.side == side && u.is_alive()).count();
    let summary = MatchSummary {
        scenario: scenario.name.clone(),
        seed,
        result,
        rounds: sim.round(),
        events: counter.count,
        shots: counter.shots,
        deaths: counter.deaths,
        player_survivors: survivors(Side::Player),
        enemy_survivors: survivors(Side::Enemy),
        final_state_hash: sim.state_hash(),
    };

    tracing::info!(
        scenario = %summary.scenario,
        seed,
        result = ?summary.result,
        rounds = summary.rounds,
        shots = summary.shots,
        "Match finished"
    );
    Ok(summary)
}

/// Interactive session: the player side takes JSON commands, the enemy
/// side is played by the decision policy.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: TacticsSim,
}

impl HeadlessRunner {
    /// Build `scenario` with `seed` for interactive play.
    pub fn new(scenario: &Scenario, seed: u64) -> Result<Self, ScenarioError> {
        Ok(Self {
            sim: scenario.build(seed, false)?,
        })
    }

    /// The match being played.
    pub const fn sim(&self) -> &TacticsSim {
        &self.sim
    }

    /// Serve commands from `input` until quit, end of input, or game over.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_line(&mut output, &Response::ready(&self.sim))?;
        if self.flush_events(&mut output)? {
            return output.flush();
        }

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let cmd = match Command::from_json(line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable command");
                    write_line(&mut output, &Response::error(e.to_string(), None))?;
                    continue;
                }
            };
            tracing::debug!(cmd = cmd.name(), "Command received");

            if cmd == Command::Quit {
                write_line(&mut output, &Response::ack(cmd.name()))?;
                break;
            }

            let response = self.apply(&cmd);
            let over = self.flush_events(&mut output)?;
            write_line(&mut output, &response)?;
            if over {
                break;
            }
        }

        output.flush()
    }

    /// Apply one command and describe what happened.
    pub fn apply(&mut self, cmd: &Command) -> Response {
        let name = cmd.name();
        match *cmd {
            Command::Query => Response::state(&self.sim),
            Command::Hash => Response::Hash {
                round: self.sim.round(),
                hash: self.sim.state_hash(),
            },
            Command::Move { unit, x, y } => {
                match self.sim.try_move_unit(UnitId(unit), GridCoord::new(x, y)) {
                    MoveOutcome::Moved(report) => Response::moved(&report),
                    MoveOutcome::Rejected(reason) => Response::rejected(name, &reason),
                }
            }
            Command::Fire { unit, target } => {
                let outcome = self.sim.try_fire(UnitId(unit), UnitId(target));
                match outcome.rejection() {
                    Some(reason) => Response::rejected(name, &reason),
                    None => Response::ack(name),
                }
            }
            Command::Reload { unit } => {
                let reloaded = self.sim.try_reload(UnitId(unit));
                self.flag(name, reloaded)
            }
            Command::Overwatch { unit } => {
                let entered = self.sim.try_enter_overwatch(UnitId(unit));
                self.flag(name, entered)
            }
            Command::EndTurn => {
                let ended = self.sim.end_current_unit_turn();
                self.flag(name, ended)
            }
            Command::Quit => Response::ack(name),
        }
    }

    fn flag(&self, name: &str, accepted: bool) -> Response {
        if accepted {
            Response::ack(name)
        } else {
            let reason = if self.sim.result().is_some() {
                "game_over"
            } else {
                "not_allowed"
            };
            Response::Rejected {
                cmd: name.to_string(),
                reason: reason.to_string(),
            }
        }
    }

    /// Forward pending events; report game over once. Returns whether the
    /// match has ended.
    fn flush_events<W: Write>(&mut self, output: &mut W) -> io::Result<bool> {
        for event in self.sim.drain_events() {
            let ended = matches!(event, MatchEvent::MatchEnded { .. });
            write_line(output, &Response::Event { event })?;
            if ended {
                if let Some(result) = self.sim.result() {
                    write_line(
                        output,
                        &Response::GameOver {
                            result,
                            round: self.sim.round(),
                        },
                    )?;
                }
            }
        }
        Ok(self.sim.result().is_some())
    }
}

fn write_line<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())
}
