//! Per-unit action weights for AI-driven units.

use serde::{Deserialize, Serialize};

/// Upper bound of each weight and of their sum.
pub const MAX_WEIGHT: i32 = 10;

/// Relative likelihood of each action an AI unit may pick.
///
/// Each weight lies in `0..=10` and the four sum to at most 10 once
/// [`AiWeights::clamp_and_fix_total`] has run. Units without explicit weights
/// use [`AiWeights::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AiWeights {
    /// Take an aimed shot at the nearest opponent.
    pub shoot: i32,
    /// Close distance to the nearest opponent.
    #[serde(rename = "move")]
    pub movement: i32,
    /// Move to the best covered tile.
    pub cover: i32,
    /// Enter overwatch and end the turn.
    pub overwatch: i32,
}

impl Default for AiWeights {
    fn default() -> Self {
        Self {
            shoot: 5,
            movement: 2,
            cover: 3,
            overwatch: 0,
        }
    }
}

impl AiWeights {
    /// Create weights and normalise them.
    #[must_use]
    pub fn new(shoot: i32, movement: i32, cover: i32, overwatch: i32) -> Self {
        let mut weights = Self {
            shoot,
            movement,
            cover,
            overwatch,
        };
        weights.clamp_and_fix_total();
        weights
    }

    /// Sum of all four weights.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.shoot + self.movement + self.cover + self.overwatch
    }

    /// Clamp every weight to `0..=10`, then shave the largest weight one
    /// point at a time until the sum is at most 10.
    ///
    /// Ties are broken in the order shoot, cover, move, overwatch.
    pub fn clamp_and_fix_total(&mut self) {
        self.shoot = self.shoot.clamp(0, MAX_WEIGHT);
        self.movement = self.movement.clamp(0, MAX_WEIGHT);
        self.cover = self.cover.clamp(0, MAX_WEIGHT);
        self.overwatch = self.overwatch.clamp(0, MAX_WEIGHT);

        while self.total() > MAX_WEIGHT {
            let largest = self
                .shoot
                .max(self.movement)
                .max(self.cover)
                .max(self.overwatch);
            if largest == 0 {
                break;
            }

            if self.shoot == largest {
                self.shoot -= 1;
            } else if self.cover == largest {
                self.cover -= 1;
            } else if self.movement == largest {
                self.movement -= 1;
            } else {
                self.overwatch -= 1;
            }
        }
    }
}
