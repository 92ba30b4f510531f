//! JSON protocol for interactive headless play.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands for the active player unit
//! **Output (stdout):** Match events and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Every match event is forwarded as `{"type":"event",...}`
//! 3. The controller sends commands for the active player unit
//! 4. On match end, outputs `{"type":"game_over","result":"victory"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","round":1,"active":0}
//! -> {"cmd":"move","unit":0,"x":3,"y":0}
//! <- {"type":"event","event":{"event":"unit_stepped",...}}
//! <- {"type":"moved","unit":0,"position":[3,0],"steps":3,"completed":true,"killed":false}
//! -> {"cmd":"fire","unit":0,"target":4}
//! <- {"type":"rejected","cmd":"fire","reason":"out_of_range"}
//! -> {"cmd":"end_turn"}
//! ```

use serde::{Deserialize, Serialize};

use squad_core::events::MatchEvent;
use squad_core::grid::GridCoord;
use squad_core::simulation::{MoveReport, TacticsSim};
use squad_core::turn::MatchResult;
use squad_core::unit::{Side, Unit};

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Report the full match state.
    Query,

    /// Move a unit toward a tile.
    Move { unit: u32, x: i32, y: i32 },

    /// Take an aimed shot.
    Fire { unit: u32, target: u32 },

    /// Reload.
    Reload { unit: u32 },

    /// Enter overwatch.
    Overwatch { unit: u32 },

    /// End the active unit's turn.
    EndTurn,

    /// Report the state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Move { .. } => "move",
            Self::Fire { .. } => "fire",
            Self::Reload { .. } => "reload",
            Self::Overwatch { .. } => "overwatch",
            Self::EndTurn => "end_turn",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready.
    Ready {
        /// Protocol version.
        version: String,
        /// Current round.
        round: u32,
        /// Active unit, if one is waiting for commands.
        active: Option<u32>,
    },

    /// A match event.
    Event {
        /// The event.
        event: MatchEvent,
    },

    /// The command was carried out.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// A move was paid for; reports where the unit actually ended up.
    Moved {
        /// Moving unit.
        unit: u32,
        /// Final tile.
        position: GridCoord,
        /// Tiles walked.
        steps: usize,
        /// False when the walk stopped early at an occupied tile.
        completed: bool,
        /// Reactive fire killed the unit on the way.
        killed: bool,
    },

    /// The command was refused by the rules; nothing changed.
    Rejected {
        /// Command name.
        cmd: String,
        /// Why, in snake case.
        reason: String,
    },

    /// Full match state.
    State {
        /// Current round.
        round: u32,
        /// Active unit.
        active: Option<u32>,
        /// Every unit still in play.
        units: Vec<UnitState>,
        /// State hash.
        hash: u64,
    },

    /// State hash.
    Hash {
        /// Current round.
        round: u32,
        /// State hash.
        hash: u64,
    },

    /// The match is over.
    GameOver {
        /// Result from the player's side.
        result: MatchResult,
        /// Final round.
        round: u32,
    },

    /// Malformed input.
    Error {
        /// Error message.
        message: String,
        /// Command name, if the line parsed.
        cmd: Option<String>,
    },
}

/// One unit in a [`Response::State`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    /// Unit id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Owning side.
    pub side: Side,
    /// Hit points.
    pub hp: u32,
    /// Action points.
    pub ap: u32,
    /// Rounds in the magazine.
    pub ammo: u32,
    /// Tile.
    pub position: GridCoord,
    /// On overwatch.
    pub overwatch: bool,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id.0,
            name: unit.name.clone(),
            side: unit.side,
            hp: unit.hp,
            ap: unit.ap,
            ammo: unit.ammo,
            position: unit.grid_pos,
            overwatch: unit.is_overwatch,
        }
    }
}

impl Response {
    /// Create a ready message.
    pub fn ready(sim: &TacticsSim) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            round: sim.round(),
            active: sim.current_unit().map(|u| u.id.0),
        }
    }

    /// Snapshot the match.
    pub fn state(sim: &TacticsSim) -> Self {
        Self::State {
            round: sim.round(),
            active: sim.current_unit().map(|u| u.id.0),
            units: sim.units().map(UnitState::from).collect(),
            hash: sim.state_hash(),
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Describe an accepted move.
    pub fn moved(report: &MoveReport) -> Self {
        Self::Moved {
            unit: report.unit.0,
            position: report.path.last().copied().unwrap_or_default(),
            steps: report.path.len().saturating_sub(1),
            completed: report.completed,
            killed: report.killed,
        }
    }

    /// Create a rejection from any serializable reason.
    pub fn rejected<R: Serialize + std::fmt::Debug>(cmd: &str, reason: &R) -> Self {
        let reason = serde_json::to_value(reason)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{reason:?}"));
        Self::Rejected {
            cmd: cmd.to_string(),
            reason,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}
