//! # Squad Core
//!
//! Deterministic simulation core for turn-based squad tactics.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No IO
//! - No system randomness (dice are injected)
//! - No floating-point math in world coordinates (uses fixed-point)
//!
//! This separation enables:
//! - Headless matches and batch balance runs
//! - Replays from a seed
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tile map, occupancy and coordinate transforms
//! - [`pathfinding`] - BFS paths and reachability
//! - [`combat`] - Shot resolution, cover and hit chance
//! - [`turn`] - Round and turn state machine
//! - [`ai`] - Enemy decision policy
//! - [`simulation`] - The match context tying it all together
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod data;
pub mod dice;
pub mod error;
pub mod events;
pub mod grid;
pub mod los;
pub mod math;
pub mod pathfinding;
pub mod simulation;
pub mod turn;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiWeights, EnemyAction};
    pub use crate::combat::{
        hit_chance, resolve_shot, FireContext, ShotKind, ShotOutcome, ShotRejection, ShotReport,
        ShotRequest,
    };
    pub use crate::data::{CharacterClass, ClassRegistry, RulesConfig};
    pub use crate::dice::{Dice, SeededDice};
    pub use crate::error::{Result, TacticsError};
    pub use crate::events::{MatchEvent, NullSink, PresentationSink};
    pub use crate::grid::{CoverLevel, GridCoord, GridMap, MapLayout, Tile};
    pub use crate::los::{GridLineOfFire, LineOfFire, OpenField};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::simulation::{MoveOutcome, MoveRejection, MoveReport, TacticsSim, UnitSpawn};
    pub use crate::turn::{MatchResult, TurnState};
    pub use crate::unit::{Side, Unit, UnitId};
}
