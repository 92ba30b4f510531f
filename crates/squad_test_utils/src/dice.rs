//! Scripted dice.
//!
//! Combat and AI tests need exact rolls. [`ScriptedDice`] replays a queue
//! of values and then falls back to a fixed default, so a test can pin
//! the first few draws and ignore the rest.

use std::collections::VecDeque;

use squad_core::dice::Dice;
use squad_core::math::{Fixed, Vec2Fixed};

/// What [`ScriptedDice`] returns once its script is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// The low end of the requested range.
    #[default]
    Low,
    /// The high end of the requested range.
    High,
}

/// Dice that replay a queue of rolls.
///
/// Every value is clamped to the requested range. Scatter is always zero
/// unless offsets are queued with [`ScriptedDice::with_scatter`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<i32>,
    scatter: VecDeque<Vec2Fixed>,
    fallback: Fallback,
    consumed: usize,
}

impl ScriptedDice {
    /// Dice that replay `rolls` in order.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Dice that always roll the low end: AI picks its first action and
    /// every shot with a positive chance hits.
    #[must_use]
    pub fn always_low() -> Self {
        Self::default()
    }

    /// Dice that always roll the high end: every shot below 100% misses.
    #[must_use]
    pub fn always_high() -> Self {
        Self {
            fallback: Fallback::High,
            ..Self::default()
        }
    }

    /// Queue scatter offsets for missed shots.
    #[must_use]
    pub fn with_scatter(mut self, offsets: impl IntoIterator<Item = Vec2Fixed>) -> Self {
        self.scatter.extend(offsets);
        self
    }

    /// Rolls still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    /// Rolls taken so far, scripted or not.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, low: i32, high: i32) -> i32 {
        self.consumed += 1;
        let high = high.max(low);
        let value = self.rolls.pop_front().unwrap_or(match self.fallback {
            Fallback::Low => low,
            Fallback::High => high,
        });
        value.clamp(low, high)
    }

    fn scatter(&mut self, _radius: Fixed) -> Vec2Fixed {
        self.scatter.pop_front().unwrap_or(Vec2Fixed::ZERO)
    }
}
