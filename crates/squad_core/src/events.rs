//! Match events for the presentation layer.
//!
//! The core never animates anything. It records what happened as
//! [`MatchEvent`]s in order; a front end drains them and plays them back.

use serde::{Deserialize, Serialize};

use crate::combat::ShotReport;
use crate::grid::GridCoord;
use crate::turn::MatchResult;
use crate::unit::{Side, UnitId};

/// Something that happened during a match, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// The match was set up.
    MatchStarted {
        /// Living player units.
        players: usize,
        /// Living enemy units.
        enemies: usize,
    },
    /// A new round began.
    RoundStarted {
        /// Round number, starting at 1.
        round: u32,
    },
    /// A unit became the active unit.
    TurnStarted {
        /// Active unit.
        unit: UnitId,
        /// Its side.
        side: Side,
        /// Current round.
        round: u32,
    },
    /// A unit turned to face a tile before acting.
    UnitFaced {
        /// Turning unit.
        unit: UnitId,
        /// Tile it now faces.
        toward: GridCoord,
    },
    /// A unit moved one tile.
    UnitStepped {
        /// Moving unit.
        unit: UnitId,
        /// Tile left.
        from: GridCoord,
        /// Tile entered.
        to: GridCoord,
    },
    /// A shot was resolved.
    ShotFired(ShotReport),
    /// A unit refilled its magazine.
    Reloaded {
        /// Reloading unit.
        unit: UnitId,
    },
    /// A unit started watching for movement.
    OverwatchEntered {
        /// Watching unit.
        unit: UnitId,
    },
    /// A unit's overwatch stance ended.
    OverwatchCleared {
        /// Unit that stopped watching.
        unit: UnitId,
    },
    /// A unit was reduced to zero hit points.
    UnitDied {
        /// Dead unit.
        unit: UnitId,
    },
    /// A dead unit was taken off the board.
    UnitRemoved {
        /// Removed unit.
        unit: UnitId,
    },
    /// The match reached a terminal state.
    MatchEnded {
        /// Final result from the player's point of view.
        result: MatchResult,
    },
}

/// Receiver of match events, typically a renderer or logger.
pub trait PresentationSink {
    /// Handle one event.
    fn on_event(&mut self, event: &MatchEvent);
}

impl PresentationSink for Vec<MatchEvent> {
    fn on_event(&mut self, event: &MatchEvent) {
        self.push(event.clone());
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_event(&mut self, _event: &MatchEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = MatchEvent::UnitStepped {
            unit: UnitId(3),
            from: GridCoord::new(1, 2),
            to: GridCoord::new(2, 2),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"unit_stepped\""));
        assert!(json.contains("\"from\":[1,2]"));

        let back: MatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<MatchEvent> = Vec::new();
        sink.on_event(&MatchEvent::RoundStarted { round: 1 });
        sink.on_event(&MatchEvent::Reloaded { unit: UnitId(1) });
        assert_eq!(
            sink,
            vec![
                MatchEvent::RoundStarted { round: 1 },
                MatchEvent::Reloaded { unit: UnitId(1) },
            ]
        );

        NullSink.on_event(&MatchEvent::RoundStarted { round: 2 });
    }
}
